//! Table contents for every view, as plain strings.
//!
//! Kept apart from the widget code so the cell formatting can be tested
//! without a terminal.

use crate::aggregate::{cluster_usage, instance_usage, meter};
use crate::agent::AgentStatus;
use crate::model::{
    short_name, Cluster, ClusterSnapshot, Connectivity, ContainerInstance, TaskDefinition,
};

use super::utils::{format_date, format_date_time, title_case, truncate_left, truncate_text};

pub const NOT_AVAILABLE: &str = "n/a";

pub const CLUSTER_HEADERS: [&str; 8] = [
    "Name", "Status", "Type", "Instances", "Services", "Tasks", "CPU", "Memory",
];
pub const SERVICE_HEADERS: [&str; 6] = ["Name ▾", "TaskDef", "Images", "Status", "Deployed", "Tasks"];
pub const TASK_HEADERS: [&str; 7] = [
    "TaskDef ▾",
    "Images",
    "Status",
    "Created",
    "EC2 Instance",
    "Arn",
    "Version",
];
pub const INSTANCE_HEADERS: [&str; 8] = [
    "Instance Id ▾",
    "Status",
    "Type",
    "ECS Agent",
    "Registered",
    "Tasks",
    "CPU",
    "Memory",
];

const SERVICE_IMAGE_WIDTH: usize = 50;
const TASK_IMAGE_WIDTH: usize = 20;
const TASK_ARN_WIDTH: usize = 8;
const INSTANCE_TASKS_WIDTH: usize = 40;

/// One cluster table row; meters are summed over `instances`.
pub fn cluster_row(
    cluster: &Cluster,
    instances: &[ContainerInstance],
    meter_width: usize,
) -> Vec<String> {
    let usage = cluster_usage(instances);

    vec![
        cluster.name.clone(),
        title_case(&cluster.status),
        cluster.cluster_type().to_string(),
        cluster.registered_instances.to_string(),
        cluster.active_services.to_string(),
        cluster.running_tasks.to_string(),
        meter(usage.cpu_used, usage.cpu_total, meter_width),
        meter(usage.memory_used, usage.memory_total, meter_width),
    ]
}

/// Short image names of a definition joined with commas.
fn images(definition: Option<&TaskDefinition>, max_width: usize) -> String {
    match definition {
        Some(definition) => definition
            .images
            .iter()
            .map(|image| truncate_text(short_name(image), max_width))
            .collect::<Vec<_>>()
            .join(","),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn service_rows(snapshot: &ClusterSnapshot) -> Vec<Vec<String>> {
    snapshot
        .services
        .iter()
        .map(|service| {
            let definition = service
                .task_definition
                .as_deref()
                .and_then(|arn| snapshot.task_definition(arn));

            let deployed = service
                .last_deployed_at()
                .map(format_date_time)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());

            let mut tasks = service.running_count.to_string();
            if service.pending_count > 0 {
                tasks = format!("{tasks} ({} pending)", service.pending_count);
            }
            if service.desired_count != service.running_count {
                tasks = format!("{tasks} ({} desired)", service.desired_count);
            }

            vec![
                service.name.clone(),
                service
                    .task_definition
                    .as_deref()
                    .map(short_name)
                    .unwrap_or(NOT_AVAILABLE)
                    .to_string(),
                images(definition, SERVICE_IMAGE_WIDTH),
                title_case(&service.status),
                deployed,
                tasks,
            ]
        })
        .collect()
}

fn connectivity_marker(connectivity: Connectivity) -> &'static str {
    match connectivity {
        Connectivity::Connected => "🔗",
        Connectivity::Disconnected => "🚫",
    }
}

pub fn task_rows(snapshot: &ClusterSnapshot) -> Vec<Vec<String>> {
    snapshot
        .tasks
        .iter()
        .map(|task| {
            let instance = task
                .container_instance_arn
                .as_deref()
                .and_then(|arn| snapshot.ec2_instance_id(arn))
                .unwrap_or(NOT_AVAILABLE);

            vec![
                task.short_task_definition().to_string(),
                images(
                    snapshot.task_definition(&task.task_definition_arn),
                    TASK_IMAGE_WIDTH,
                ),
                format!(
                    "{} {}",
                    title_case(&task.last_status),
                    connectivity_marker(task.connectivity)
                ),
                task.created_at
                    .map(format_date_time)
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                instance.to_string(),
                truncate_left(short_name(&task.arn), TASK_ARN_WIDTH),
                task.version.to_string(),
            ]
        })
        .collect()
}

/// Running count, pending count and the task definitions placed on an instance.
fn instance_tasks(snapshot: &ClusterSnapshot, instance: &ContainerInstance) -> String {
    let mut count = instance.running_tasks.to_string();
    if instance.pending_tasks > 0 {
        count = format!("{count} ({} pending)", instance.pending_tasks);
    }
    if count == "0" {
        return count;
    }

    let placed = snapshot
        .tasks_on(instance)
        .map(|t| t.short_task_definition())
        .collect::<Vec<_>>()
        .join(",");
    format!("{count}: {}", truncate_text(&placed, INSTANCE_TASKS_WIDTH))
}

pub fn instance_rows(
    snapshot: &ClusterSnapshot,
    latest_agent: Option<&str>,
    meter_width: usize,
) -> Vec<Vec<String>> {
    snapshot
        .instances
        .iter()
        .map(|instance| {
            let agent = instance.agent_version.as_deref();
            let agent_cell = format!(
                "{} {}",
                agent.unwrap_or(NOT_AVAILABLE),
                AgentStatus::of(agent, latest_agent).marker()
            );

            let (cpu, memory) = match instance_usage(instance) {
                Some(usage) => (
                    meter(usage.cpu_used, usage.cpu_total, meter_width),
                    meter(usage.memory_used, usage.memory_total, meter_width),
                ),
                None => (String::new(), String::new()),
            };

            vec![
                instance.ec2_instance_id.clone(),
                title_case(&instance.status),
                instance.instance_type().unwrap_or(NOT_AVAILABLE).to_string(),
                agent_cell,
                instance
                    .registered_at
                    .map(format_date)
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                instance_tasks(snapshot, instance),
                cpu,
                memory,
            ]
        })
        .collect()
}
