//! Remote inventory contract consumed by the cache.
//!
//! The production implementation lives in [`crate::aws`]; tests substitute
//! an in-memory double.

use crate::error::InventoryError;
use crate::model::{Cluster, ContainerInstance, Service, Task, TaskDefinition};

/// Read-only queries against a container-orchestration account.
///
/// Each call either returns fully decoded records or fails; implementations
/// must not return partial results.
#[allow(async_fn_in_trait)]
pub trait InventoryClient {
    /// Every cluster in the account, with summary statistics.
    async fn list_clusters(&self) -> Result<Vec<Cluster>, InventoryError>;

    async fn list_services(&self, cluster: &Cluster) -> Result<Vec<Service>, InventoryError>;

    async fn list_tasks(&self, cluster: &Cluster) -> Result<Vec<Task>, InventoryError>;

    async fn list_instances(
        &self,
        cluster: &Cluster,
    ) -> Result<Vec<ContainerInstance>, InventoryError>;

    /// Resolves one task definition identifier (ARN or `family:revision`).
    async fn describe_task_definition(&self, arn: &str)
        -> Result<TaskDefinition, InventoryError>;
}
