//! Text and time formatting helpers for table cells.

use chrono::{DateTime, Local, Utc};

const ELLIPSIS: char = '…';

/// Keeps the first `max_width` characters, replacing the last kept one with
/// an ellipsis if anything was cut.
///
/// # Examples
/// ```
/// use ecs_scope::ui::utils::truncate_text;
///
/// assert_eq!(truncate_text("nginx:1.25-alpine", 8), "nginx:1…");
/// assert_eq!(truncate_text("nginx", 8), "nginx");
/// ```
pub fn truncate_text(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    let keep = max_width.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push(ELLIPSIS);
    out
}

/// Keeps the last `max_width` characters, with a leading ellipsis if
/// anything was cut.
///
/// # Examples
/// ```
/// use ecs_scope::ui::utils::truncate_left;
///
/// assert_eq!(truncate_left("0123456789abcdef", 8), "…9abcdef");
/// ```
pub fn truncate_left(text: &str, max_width: usize) -> String {
    let len = text.chars().count();
    if len <= max_width {
        return text.to_string();
    }
    let keep = max_width.saturating_sub(1);
    let mut out = String::new();
    out.push(ELLIPSIS);
    out.extend(text.chars().skip(len - keep));
    out
}

/// `ACTIVE` -> `Active`, `DEREGISTERING_NOW` -> `Deregistering_Now`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Local date, time and zone, e.g. `03/14/24 2:05pm +01:00`.
pub fn format_date_time(when: DateTime<Utc>) -> String {
    when.with_timezone(&Local)
        .format("%m/%d/%y %-I:%M%P %:z")
        .to_string()
}

/// Local date, e.g. `03/14/24`.
pub fn format_date(when: DateTime<Utc>) -> String {
    when.with_timezone(&Local).format("%m/%d/%y").to_string()
}

/// Local time with seconds, e.g. `2:05:09pm`.
pub fn format_time(when: DateTime<Utc>) -> String {
    when.with_timezone(&Local).format("%-I:%M:%S%P").to_string()
}
