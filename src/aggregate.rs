//! Resource usage aggregation and text meters.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::model::{ContainerInstance, CPU_RESOURCE, MEMORY_RESOURCE};

/// Glyph for a filled meter cell.
pub const METER_FULL: char = '█';
/// Glyph for an empty meter cell.
pub const METER_EMPTY: char = '▒';

/// CPU and memory counters for one instance or a whole cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceTotals {
    pub cpu_used: i64,
    pub cpu_total: i64,
    pub memory_used: i64,
    pub memory_total: i64,
}

impl Add for ResourceTotals {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            cpu_used: self.cpu_used + other.cpu_used,
            cpu_total: self.cpu_total + other.cpu_total,
            memory_used: self.memory_used + other.memory_used,
            memory_total: self.memory_total + other.memory_total,
        }
    }
}

impl AddAssign for ResourceTotals {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sum for ResourceTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Usage of a single instance, or `None` when any of the registered or
/// remaining CPU/memory values is missing.
pub fn instance_usage(instance: &ContainerInstance) -> Option<ResourceTotals> {
    let cpu_total = instance.registered_value(CPU_RESOURCE)?;
    let cpu_remaining = instance.remaining_value(CPU_RESOURCE)?;
    let memory_total = instance.registered_value(MEMORY_RESOURCE)?;
    let memory_remaining = instance.remaining_value(MEMORY_RESOURCE)?;

    Some(ResourceTotals {
        cpu_used: cpu_total - cpu_remaining,
        cpu_total,
        memory_used: memory_total - memory_remaining,
        memory_total,
    })
}

/// Field-wise sum. Unavailable entries are skipped.
pub fn sum_usage<I>(usages: I) -> ResourceTotals
where
    I: IntoIterator<Item = Option<ResourceTotals>>,
{
    usages.into_iter().flatten().sum()
}

/// Summed usage of every instance that reports it.
pub fn cluster_usage(instances: &[ContainerInstance]) -> ResourceTotals {
    sum_usage(instances.iter().map(instance_usage))
}

/// Renders a proportional meter of exactly `width` glyphs.
///
/// A non-positive `total` renders as empty.
pub fn meter(used: i64, total: i64, width: usize) -> String {
    let filled = if total > 0 {
        let ratio = (used as f64 / total as f64).clamp(0.0, 1.0);
        // f64::round rounds half away from zero
        ((ratio * width as f64).round() as usize).min(width)
    } else {
        0
    };

    let mut out = String::with_capacity(width * METER_FULL.len_utf8());
    out.extend(std::iter::repeat(METER_FULL).take(filled));
    out.extend(std::iter::repeat(METER_EMPTY).take(width - filled));
    out
}
