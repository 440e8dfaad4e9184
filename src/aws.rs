//! AWS ECS implementation of the inventory client.
//!
//! List calls go through the SDK paginators; the matching describe calls are
//! batched to the per-request limits ECS enforces. SDK records are decoded
//! into [`crate::model`] types here and nowhere else.

use aws_sdk_ecs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ecs::types::{self as ecs, ClusterField};
use aws_sdk_ecs::Client;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use tracing::{debug, warn};

use crate::client::InventoryClient;
use crate::error::InventoryError;
use crate::model::{
    Cluster, Connectivity, ContainerInstance, Deployment, Resource, Service, Task, TaskDefinition,
};

/// DescribeClusters, DescribeTasks and DescribeContainerInstances accept 100 identifiers.
const DESCRIBE_BATCH: usize = 100;
/// DescribeServices accepts 10 identifiers.
const DESCRIBE_SERVICES_BATCH: usize = 10;

/// Client for the ECS control plane of one account and region.
pub struct EcsClient {
    /// AWS ECS SDK client
    client: Client,
    /// Region the SDK resolved, for display
    region: Option<String>,
}

impl EcsClient {
    /// Creates a new ECS client with optional region and profile configuration.
    ///
    /// # Arguments
    /// * `region` - Optional AWS region override (e.g., "us-east-1")
    /// * `profile` - Optional AWS profile name from ~/.aws/credentials
    ///
    /// Credentials are resolved lazily; a missing or invalid profile surfaces
    /// as [`InventoryError::Credentials`] on the first request.
    pub async fn new(region: Option<String>, profile: Option<String>) -> Self {
        let mut config_loader = aws_config::from_env();

        if let Some(region_str) = region {
            config_loader = config_loader.region(aws_config::Region::new(region_str));
        }

        if let Some(profile_name) = profile {
            config_loader = config_loader.profile_name(profile_name);
        }

        let config = config_loader.load().await;
        let region = config.region().map(|r| r.to_string());
        debug!(region = ?region, "initialised ECS client");

        Self {
            client: Client::new(&config),
            region,
        }
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

impl InventoryClient for EcsClient {
    async fn list_clusters(&self) -> Result<Vec<Cluster>, InventoryError> {
        let arns: Vec<String> = self
            .client
            .list_clusters()
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| sdk_error("ListClusters", e))?;

        let mut clusters = Vec::with_capacity(arns.len());
        for batch in arns.chunks(DESCRIBE_BATCH) {
            let resp = self
                .client
                .describe_clusters()
                .set_clusters(Some(batch.to_vec()))
                .include(ClusterField::Statistics)
                .send()
                .await
                .map_err(|e| sdk_error("DescribeClusters", e))?;

            log_failures("DescribeClusters", resp.failures());
            clusters.extend(resp.clusters().iter().map(decode_cluster));
        }

        Ok(clusters)
    }

    async fn list_services(&self, cluster: &Cluster) -> Result<Vec<Service>, InventoryError> {
        let arns: Vec<String> = self
            .client
            .list_services()
            .cluster(&cluster.arn)
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| sdk_error("ListServices", e))?;

        let mut services = Vec::with_capacity(arns.len());
        for batch in arns.chunks(DESCRIBE_SERVICES_BATCH) {
            let resp = self
                .client
                .describe_services()
                .cluster(&cluster.arn)
                .set_services(Some(batch.to_vec()))
                .send()
                .await
                .map_err(|e| sdk_error("DescribeServices", e))?;

            log_failures("DescribeServices", resp.failures());
            services.extend(resp.services().iter().map(decode_service));
        }

        Ok(services)
    }

    async fn list_tasks(&self, cluster: &Cluster) -> Result<Vec<Task>, InventoryError> {
        let arns: Vec<String> = self
            .client
            .list_tasks()
            .cluster(&cluster.arn)
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| sdk_error("ListTasks", e))?;

        let mut tasks = Vec::with_capacity(arns.len());
        for batch in arns.chunks(DESCRIBE_BATCH) {
            let resp = self
                .client
                .describe_tasks()
                .cluster(&cluster.arn)
                .set_tasks(Some(batch.to_vec()))
                .send()
                .await
                .map_err(|e| sdk_error("DescribeTasks", e))?;

            log_failures("DescribeTasks", resp.failures());
            tasks.extend(resp.tasks().iter().map(decode_task));
        }

        Ok(tasks)
    }

    async fn list_instances(
        &self,
        cluster: &Cluster,
    ) -> Result<Vec<ContainerInstance>, InventoryError> {
        let arns: Vec<String> = self
            .client
            .list_container_instances()
            .cluster(&cluster.arn)
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| sdk_error("ListContainerInstances", e))?;

        let mut instances = Vec::with_capacity(arns.len());
        for batch in arns.chunks(DESCRIBE_BATCH) {
            let resp = self
                .client
                .describe_container_instances()
                .cluster(&cluster.arn)
                .set_container_instances(Some(batch.to_vec()))
                .send()
                .await
                .map_err(|e| sdk_error("DescribeContainerInstances", e))?;

            log_failures("DescribeContainerInstances", resp.failures());
            instances.extend(
                resp.container_instances()
                    .iter()
                    .map(|i| decode_instance(&cluster.arn, i)),
            );
        }

        Ok(instances)
    }

    async fn describe_task_definition(
        &self,
        arn: &str,
    ) -> Result<TaskDefinition, InventoryError> {
        let resp = self
            .client
            .describe_task_definition()
            .task_definition(arn)
            .send()
            .await
            .map_err(|e| sdk_error("DescribeTaskDefinition", e))?;

        Ok(match resp.task_definition() {
            Some(definition) => decode_task_definition(arn, definition),
            None => TaskDefinition {
                arn: arn.to_string(),
                images: Vec::new(),
            },
        })
    }
}

/// Converts an SDK failure into the inventory error taxonomy.
fn sdk_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> InventoryError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let code = err.code().map(str::to_string);
    let message = DisplayErrorContext(&err).to_string();
    let error = InventoryError::classify(operation, code.as_deref(), message);
    warn!(operation, error = %error, "ECS request failed");
    error
}

fn log_failures(operation: &'static str, failures: &[ecs::Failure]) {
    for failure in failures {
        warn!(
            operation,
            arn = failure.arn().unwrap_or("unknown"),
            reason = failure.reason().unwrap_or("unknown"),
            "ECS reported a partial failure"
        );
    }
}

fn to_utc(dt: &aws_sdk_ecs::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

fn decode_cluster(c: &ecs::Cluster) -> Cluster {
    let arn = c.cluster_arn().unwrap_or_default().to_string();
    let name = c
        .cluster_name()
        .map(str::to_string)
        .unwrap_or_else(|| crate::model::short_name(&arn).to_string());

    Cluster {
        name,
        arn,
        status: c.status().unwrap_or("unknown").to_string(),
        registered_instances: i64::from(c.registered_container_instances_count()),
        active_services: i64::from(c.active_services_count()),
        running_tasks: i64::from(c.running_tasks_count()),
        statistics: c
            .statistics()
            .iter()
            .map(|kv| {
                (
                    kv.name().unwrap_or_default().to_string(),
                    kv.value().unwrap_or_default().to_string(),
                )
            })
            .collect(),
    }
}

fn decode_service(s: &ecs::Service) -> Service {
    Service {
        name: s.service_name().unwrap_or("unknown").to_string(),
        arn: s.service_arn().unwrap_or_default().to_string(),
        cluster_arn: s.cluster_arn().unwrap_or_default().to_string(),
        status: s.status().unwrap_or("unknown").to_string(),
        desired_count: i64::from(s.desired_count()),
        running_count: i64::from(s.running_count()),
        pending_count: i64::from(s.pending_count()),
        task_definition: s.task_definition().map(str::to_string),
        deployments: s
            .deployments()
            .iter()
            .map(|d| Deployment {
                created_at: d.created_at().and_then(to_utc),
            })
            .collect(),
    }
}

fn decode_task(t: &ecs::Task) -> Task {
    let connectivity = match t.connectivity() {
        Some(ecs::Connectivity::Connected) => Connectivity::Connected,
        _ => Connectivity::Disconnected,
    };

    Task {
        arn: t.task_arn().unwrap_or_default().to_string(),
        cluster_arn: t.cluster_arn().unwrap_or_default().to_string(),
        task_definition_arn: t.task_definition_arn().unwrap_or_default().to_string(),
        container_instance_arn: t.container_instance_arn().map(str::to_string),
        connectivity,
        last_status: t.last_status().unwrap_or("unknown").to_string(),
        created_at: t.created_at().and_then(to_utc),
        version: t.version(),
    }
}

fn decode_task_definition(requested: &str, d: &ecs::TaskDefinition) -> TaskDefinition {
    TaskDefinition {
        arn: d.task_definition_arn().unwrap_or(requested).to_string(),
        images: d
            .container_definitions()
            .iter()
            .filter_map(|c| c.image().map(str::to_string))
            .collect(),
    }
}

fn decode_resources(resources: &[ecs::Resource]) -> Vec<Resource> {
    // Only integer-typed resources carry CPU and MEMORY
    resources
        .iter()
        .filter(|r| r.r#type().map_or(true, |t| t == "INTEGER"))
        .filter_map(|r| {
            r.name().map(|name| Resource {
                name: name.to_string(),
                value: i64::from(r.integer_value()),
            })
        })
        .collect()
}

fn decode_instance(cluster_arn: &str, i: &ecs::ContainerInstance) -> ContainerInstance {
    ContainerInstance {
        ec2_instance_id: i.ec2_instance_id().unwrap_or("unknown").to_string(),
        arn: i.container_instance_arn().unwrap_or_default().to_string(),
        cluster_arn: cluster_arn.to_string(),
        status: i.status().unwrap_or("unknown").to_string(),
        registered_at: i.registered_at().and_then(to_utc),
        pending_tasks: i64::from(i.pending_tasks_count()),
        running_tasks: i64::from(i.running_tasks_count()),
        registered_resources: decode_resources(i.registered_resources()),
        remaining_resources: decode_resources(i.remaining_resources()),
        attributes: i
            .attributes()
            .iter()
            .map(|a| (a.name().to_string(), a.value().map(str::to_string)))
            .collect(),
        agent_version: i
            .version_info()
            .and_then(|v| v.agent_version())
            .map(str::to_string),
    }
}
