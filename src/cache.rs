//! Cluster inventory cache.
//!
//! Three caches live here, all keyed by cluster ARN where per-cluster:
//!
//! - the cluster list, loaded on first access;
//! - the container instance list of each cluster;
//! - the full [`ClusterSnapshot`] of each cluster.
//!
//! Snapshots are rebuilt on a forced refresh, which re-reads services, tasks
//! and task definitions. Instance lists are cached separately and only
//! re-read when a forced refresh drops them first; a snapshot rebuilt for any
//! other reason reuses the cached instances.

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::client::InventoryClient;
use crate::error::InventoryError;
use crate::model::{
    sort_clusters, sort_instances, sort_services, sort_tasks, Cluster, ClusterSnapshot,
    ContainerInstance, Service, Task, TaskDefinition,
};

/// Lazily populated, explicitly refreshed view of one account's clusters.
///
/// Every operation awaits its remote calls one after another and stores
/// nothing unless all of them succeed.
pub struct InventoryCache<C> {
    client: C,
    clusters: Option<Arc<[Cluster]>>,
    instances: HashMap<String, Arc<[ContainerInstance]>>,
    snapshots: HashMap<String, Arc<ClusterSnapshot>>,
}

impl<C: InventoryClient> InventoryCache<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            clusters: None,
            instances: HashMap::new(),
            snapshots: HashMap::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the clusters sorted by name, loading them on first call.
    ///
    /// The first load also fetches the instance list of every cluster so
    /// that cluster-level meters are available before any cluster is opened.
    ///
    /// # Errors
    /// Returns the first failed remote call. Nothing is cached in that case.
    pub async fn list_clusters(&mut self) -> Result<Arc<[Cluster]>, InventoryError> {
        if let Some(clusters) = &self.clusters {
            debug!(count = clusters.len(), "cluster list served from cache");
            return Ok(Arc::clone(clusters));
        }

        let started = Instant::now();
        let mut clusters = self.client.list_clusters().await?;
        sort_clusters(&mut clusters);

        let mut prefetched = Vec::with_capacity(clusters.len());
        let mut total_instances = 0;
        for cluster in &clusters {
            let instances = self.fetch_instances(cluster).await?;
            total_instances += instances.len();
            prefetched.push((cluster.arn.clone(), instances));
        }
        self.instances.extend(prefetched);

        let clusters: Arc<[Cluster]> = clusters.into();
        self.clusters = Some(Arc::clone(&clusters));

        info!(
            clusters = clusters.len(),
            instances = total_instances,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded cluster list"
        );
        Ok(clusters)
    }

    /// Returns the cached snapshot of `cluster`, building it on a miss.
    ///
    /// # Errors
    /// Returns the first failed remote call of the build.
    pub async fn get_snapshot(
        &mut self,
        cluster: &Cluster,
    ) -> Result<Arc<ClusterSnapshot>, InventoryError> {
        if let Some(snapshot) = self.snapshots.get(&cluster.arn) {
            debug!(cluster = %cluster.name, "snapshot served from cache");
            return Ok(Arc::clone(snapshot));
        }
        self.build_snapshot(cluster).await
    }

    /// Drops the cached instances of `cluster` and rebuilds its snapshot.
    ///
    /// # Errors
    /// Returns the first failed remote call. The instance cache entry stays
    /// dropped and the previous snapshot stays in place.
    pub async fn refresh_snapshot(
        &mut self,
        cluster: &Cluster,
    ) -> Result<Arc<ClusterSnapshot>, InventoryError> {
        info!(cluster = %cluster.name, "forced refresh");
        self.instances.remove(&cluster.arn);
        self.build_snapshot(cluster).await
    }

    /// The cached instance list of `cluster`, empty if none is cached.
    pub fn get_containers(&self, cluster: &Cluster) -> Arc<[ContainerInstance]> {
        self.instances
            .get(&cluster.arn)
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    async fn build_snapshot(
        &mut self,
        cluster: &Cluster,
    ) -> Result<Arc<ClusterSnapshot>, InventoryError> {
        let started = Instant::now();

        let mut services = self.client.list_services(cluster).await?;
        sort_services(&mut services);

        let mut tasks = self.client.list_tasks(cluster).await?;
        sort_tasks(&mut tasks);

        let task_definitions = self.resolve_task_definitions(&services, &tasks).await?;

        let instances = match self.instances.get(&cluster.arn) {
            Some(cached) => Arc::clone(cached),
            None => {
                let fetched = self.fetch_instances(cluster).await?;
                self.instances
                    .insert(cluster.arn.clone(), Arc::clone(&fetched));
                fetched
            }
        };

        // The wall clock may step backwards; a replacement is never older.
        let now = Utc::now();
        let refreshed_at = match self.snapshots.get(&cluster.arn) {
            Some(previous) if previous.refreshed_at > now => previous.refreshed_at,
            _ => now,
        };

        let snapshot = Arc::new(ClusterSnapshot {
            cluster: cluster.clone(),
            services,
            tasks,
            task_definitions,
            instances,
            refreshed_at,
        });
        self.snapshots
            .insert(cluster.arn.clone(), Arc::clone(&snapshot));

        info!(
            cluster = %cluster.name,
            services = snapshot.services.len(),
            tasks = snapshot.tasks.len(),
            task_definitions = snapshot.task_definitions.len(),
            instances = snapshot.instances.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built snapshot"
        );
        Ok(snapshot)
    }

    /// Describes each distinct task definition referenced by `tasks` or
    /// `services` exactly once.
    async fn resolve_task_definitions(
        &self,
        services: &[Service],
        tasks: &[Task],
    ) -> Result<BTreeMap<String, TaskDefinition>, InventoryError> {
        let arns: BTreeSet<&str> = tasks
            .iter()
            .map(|t| t.task_definition_arn.as_str())
            .chain(services.iter().filter_map(|s| s.task_definition.as_deref()))
            .filter(|arn| !arn.is_empty())
            .collect();

        let mut lookup = BTreeMap::new();
        for arn in arns {
            let definition = self.client.describe_task_definition(arn).await?;
            lookup.insert(arn.to_string(), definition);
        }
        Ok(lookup)
    }

    async fn fetch_instances(
        &self,
        cluster: &Cluster,
    ) -> Result<Arc<[ContainerInstance]>, InventoryError> {
        let mut instances = self.client.list_instances(cluster).await?;
        sort_instances(&mut instances);
        debug!(cluster = %cluster.name, count = instances.len(), "fetched container instances");
        Ok(instances.into())
    }
}
