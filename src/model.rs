//! ECS inventory entities.
//!
//! These records are decoded once at the client boundary and are immutable
//! afterwards. The cache cross-references them by ARN; nothing here owns
//! anything else.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Statistic value text that marks a serverless (Fargate) cluster.
pub const FARGATE_MARKER: &str = "Fargate";

/// Resource names reported by ECS container instances.
pub const CPU_RESOURCE: &str = "CPU";
pub const MEMORY_RESOURCE: &str = "MEMORY";

/// Attribute carrying the EC2 instance type of a container instance.
pub const INSTANCE_TYPE_ATTRIBUTE: &str = "ecs.instance-type";

/// How the capacity of a cluster is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterType {
    Ec2,
    Fargate,
}

impl fmt::Display for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterType::Ec2 => write!(f, "EC2"),
            ClusterType::Fargate => write!(f, "Fargate"),
        }
    }
}

/// An ECS cluster together with its summary statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub name: String,
    pub arn: String,
    pub status: String,
    pub registered_instances: i64,
    pub active_services: i64,
    pub running_tasks: i64,
    /// Raw statistic key/value pairs as returned with `include=STATISTICS`
    pub statistics: Vec<(String, String)>,
}

impl Cluster {
    /// Classifies the cluster from its statistics.
    ///
    /// A cluster is Fargate when any statistic with a non-zero value mentions
    /// Fargate. Everything else, including a cluster with no non-zero
    /// statistics at all, is EC2-backed.
    pub fn cluster_type(&self) -> ClusterType {
        let fargate = self
            .statistics
            .iter()
            .filter(|(_, value)| value != "0")
            .any(|(_, value)| value.contains(FARGATE_MARKER));

        if fargate {
            ClusterType::Fargate
        } else {
            ClusterType::Ec2
        }
    }
}

/// A single deployment of a service.
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    pub created_at: Option<DateTime<Utc>>,
}

/// An ECS service.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    pub arn: String,
    /// Owning cluster, lookup only
    pub cluster_arn: String,
    pub status: String,
    pub desired_count: i64,
    pub running_count: i64,
    pub pending_count: i64,
    /// Task definition ARN the service currently deploys
    pub task_definition: Option<String>,
    /// Deployments, most recent first
    pub deployments: Vec<Deployment>,
}

impl Service {
    /// Creation time of the most recent deployment.
    pub fn last_deployed_at(&self) -> Option<DateTime<Utc>> {
        self.deployments.first().and_then(|d| d.created_at)
    }
}

/// Whether a task's agent is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    Connected,
    #[default]
    Disconnected,
}

/// A running (or recently stopped) ECS task.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub arn: String,
    pub cluster_arn: String,
    pub task_definition_arn: String,
    /// Absent for Fargate tasks
    pub container_instance_arn: Option<String>,
    pub connectivity: Connectivity,
    pub last_status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Task {
    /// Task definition identifier without its ARN prefix, e.g. `web:12`.
    pub fn short_task_definition(&self) -> &str {
        short_name(&self.task_definition_arn)
    }
}

/// A task definition, reduced to what the dashboard shows.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDefinition {
    pub arn: String,
    /// Container image references in definition order
    pub images: Vec<String>,
}

/// A named integer resource on a container instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub value: i64,
}

/// An EC2 host registered into a cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerInstance {
    pub ec2_instance_id: String,
    pub arn: String,
    pub cluster_arn: String,
    pub status: String,
    pub registered_at: Option<DateTime<Utc>>,
    pub pending_tasks: i64,
    pub running_tasks: i64,
    /// Capacity
    pub registered_resources: Vec<Resource>,
    /// Unused capacity
    pub remaining_resources: Vec<Resource>,
    pub attributes: Vec<(String, Option<String>)>,
    pub agent_version: Option<String>,
}

impl ContainerInstance {
    pub fn registered_value(&self, name: &str) -> Option<i64> {
        find_resource(&self.registered_resources, name)
    }

    pub fn remaining_value(&self, name: &str) -> Option<i64> {
        find_resource(&self.remaining_resources, name)
    }

    /// Looks up a free-form attribute. Attributes without a value count as absent.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn instance_type(&self) -> Option<&str> {
        self.attribute(INSTANCE_TYPE_ATTRIBUTE)
    }
}

fn find_resource(resources: &[Resource], name: &str) -> Option<i64> {
    resources.iter().find(|r| r.name == name).map(|r| r.value)
}

/// Everything known about one cluster as of one fetch pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSnapshot {
    pub cluster: Cluster,
    /// Sorted by service name
    pub services: Vec<Service>,
    /// Sorted by short task definition name
    pub tasks: Vec<Task>,
    /// Every definition referenced by the tasks and services, keyed by ARN
    pub task_definitions: BTreeMap<String, TaskDefinition>,
    /// Sorted by EC2 instance id
    pub instances: Arc<[ContainerInstance]>,
    pub refreshed_at: DateTime<Utc>,
}

impl ClusterSnapshot {
    pub fn task_definition(&self, arn: &str) -> Option<&TaskDefinition> {
        self.task_definitions.get(arn)
    }

    /// EC2 instance id for a container instance ARN, if that instance is known.
    pub fn ec2_instance_id(&self, container_instance_arn: &str) -> Option<&str> {
        self.instances
            .iter()
            .find(|i| i.arn == container_instance_arn)
            .map(|i| i.ec2_instance_id.as_str())
    }

    /// Tasks placed on the given container instance, in snapshot order.
    pub fn tasks_on<'a>(&'a self, instance: &'a ContainerInstance) -> impl Iterator<Item = &'a Task> {
        self.tasks
            .iter()
            .filter(move |t| t.container_instance_arn.as_deref() == Some(instance.arn.as_str()))
    }
}

/// Strips any path-like prefix: everything up to and including the last `/`.
pub fn short_name(identifier: &str) -> &str {
    identifier
        .rsplit_once('/')
        .map_or(identifier, |(_, tail)| tail)
}

pub fn sort_clusters(clusters: &mut [Cluster]) {
    clusters.sort_by(|a, b| a.name.cmp(&b.name));
}

pub fn sort_services(services: &mut [Service]) {
    services.sort_by(|a, b| a.name.cmp(&b.name));
}

pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| a.short_task_definition().cmp(b.short_task_definition()));
}

pub fn sort_instances(instances: &mut [ContainerInstance]) {
    instances.sort_by(|a, b| a.ec2_instance_id.cmp(&b.ec2_instance_id));
}
