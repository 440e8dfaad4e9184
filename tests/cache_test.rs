//! Inventory cache behaviour against an in-memory client.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use ecs_scope::cache::InventoryCache;
use ecs_scope::client::InventoryClient;
use ecs_scope::error::InventoryError;
use ecs_scope::model::{
    Cluster, Connectivity, ContainerInstance, Resource, Service, Task, TaskDefinition,
};

const ACCOUNT: &str = "arn:aws:ecs:us-east-1:123456789012";

#[derive(Default)]
struct FakeClient {
    clusters: Vec<Cluster>,
    services: Vec<Service>,
    tasks: Vec<Task>,
    instances: Mutex<Vec<ContainerInstance>>,
    fail_instances: AtomicBool,
    cluster_calls: AtomicUsize,
    service_calls: AtomicUsize,
    task_calls: AtomicUsize,
    instance_calls: AtomicUsize,
    describe_calls: AtomicUsize,
}

impl FakeClient {
    fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn set_instances(&self, instances: Vec<ContainerInstance>) {
        *self.instances.lock().unwrap() = instances;
    }
}

impl InventoryClient for FakeClient {
    async fn list_clusters(&self) -> Result<Vec<Cluster>, InventoryError> {
        self.cluster_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.clusters.clone())
    }

    async fn list_services(&self, cluster: &Cluster) -> Result<Vec<Service>, InventoryError> {
        self.service_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .services
            .iter()
            .filter(|s| s.cluster_arn == cluster.arn)
            .cloned()
            .collect())
    }

    async fn list_tasks(&self, cluster: &Cluster) -> Result<Vec<Task>, InventoryError> {
        self.task_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tasks
            .iter()
            .filter(|t| t.cluster_arn == cluster.arn)
            .cloned()
            .collect())
    }

    async fn list_instances(
        &self,
        cluster: &Cluster,
    ) -> Result<Vec<ContainerInstance>, InventoryError> {
        self.instance_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_instances.load(Ordering::SeqCst) {
            return Err(InventoryError::Credentials {
                operation: "ListContainerInstances",
                message: "ExpiredTokenException".to_string(),
            });
        }
        Ok(self
            .instances
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.cluster_arn == cluster.arn)
            .cloned()
            .collect())
    }

    async fn describe_task_definition(&self, arn: &str) -> Result<TaskDefinition, InventoryError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(TaskDefinition {
            arn: arn.to_string(),
            images: vec![format!("repo/{}", arn.rsplit('/').next().unwrap_or(arn))],
        })
    }
}

fn cluster(name: &str) -> Cluster {
    Cluster {
        name: name.to_string(),
        arn: format!("{ACCOUNT}:cluster/{name}"),
        status: "ACTIVE".to_string(),
        registered_instances: 0,
        active_services: 0,
        running_tasks: 0,
        statistics: vec![],
    }
}

fn task_definition(family: &str) -> String {
    format!("{ACCOUNT}:task-definition/{family}")
}

fn task(cluster: &Cluster, id: usize, family: &str) -> Task {
    Task {
        arn: format!("{ACCOUNT}:task/{}/{id:032x}", cluster.name),
        cluster_arn: cluster.arn.clone(),
        task_definition_arn: task_definition(family),
        container_instance_arn: None,
        connectivity: Connectivity::Connected,
        last_status: "RUNNING".to_string(),
        created_at: None,
        version: 1,
    }
}

fn service(cluster: &Cluster, name: &str, family: Option<&str>) -> Service {
    Service {
        name: name.to_string(),
        arn: format!("{ACCOUNT}:service/{}/{name}", cluster.name),
        cluster_arn: cluster.arn.clone(),
        status: "ACTIVE".to_string(),
        desired_count: 1,
        running_count: 1,
        pending_count: 0,
        task_definition: family.map(task_definition),
        deployments: vec![],
    }
}

fn instance(cluster: &Cluster, ec2_id: &str) -> ContainerInstance {
    ContainerInstance {
        ec2_instance_id: ec2_id.to_string(),
        arn: format!("{ACCOUNT}:container-instance/{}/{ec2_id}", cluster.name),
        cluster_arn: cluster.arn.clone(),
        status: "ACTIVE".to_string(),
        registered_at: None,
        pending_tasks: 0,
        running_tasks: 0,
        registered_resources: vec![Resource {
            name: "CPU".to_string(),
            value: 2048,
        }],
        remaining_resources: vec![Resource {
            name: "CPU".to_string(),
            value: 1024,
        }],
        attributes: vec![],
        agent_version: None,
    }
}

#[tokio::test]
async fn test_task_definitions_are_described_once_each() {
    let prod = cluster("prod");
    let families = ["web:3", "worker:8", "cron:1"];
    let tasks = (0..100)
        .map(|i| task(&prod, i, families[i % families.len()]))
        .collect();

    let client = FakeClient {
        clusters: vec![prod.clone()],
        tasks,
        ..Default::default()
    };
    let mut cache = InventoryCache::new(client);

    let snapshot = cache.get_snapshot(&prod).await.unwrap();
    assert_eq!(snapshot.tasks.len(), 100);
    assert_eq!(snapshot.task_definitions.len(), 3);
    assert_eq!(FakeClient::count(&cache.client().describe_calls), 3);

    for family in families {
        let arn = task_definition(family);
        assert_eq!(snapshot.task_definition(&arn).unwrap().arn, arn);
    }
}

#[tokio::test]
async fn test_service_task_definitions_are_resolved() {
    let prod = cluster("prod");
    let client = FakeClient {
        clusters: vec![prod.clone()],
        services: vec![
            service(&prod, "web", Some("web:3")),
            service(&prod, "idle", Some("idle:1")),
            service(&prod, "bare", None),
        ],
        tasks: vec![task(&prod, 1, "web:3")],
        ..Default::default()
    };
    let mut cache = InventoryCache::new(client);

    let snapshot = cache.get_snapshot(&prod).await.unwrap();
    assert_eq!(snapshot.task_definitions.len(), 2);
    assert!(snapshot
        .task_definition(&task_definition("idle:1"))
        .is_some());
    assert_eq!(FakeClient::count(&cache.client().describe_calls), 2);
}

#[tokio::test]
async fn test_repeated_get_snapshot_fetches_once() {
    let prod = cluster("prod");
    let client = FakeClient {
        clusters: vec![prod.clone()],
        tasks: vec![task(&prod, 1, "web:3")],
        ..Default::default()
    };
    let mut cache = InventoryCache::new(client);

    let first = cache.get_snapshot(&prod).await.unwrap();
    let second = cache.get_snapshot(&prod).await.unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    let client = cache.client();
    assert_eq!(FakeClient::count(&client.service_calls), 1);
    assert_eq!(FakeClient::count(&client.task_calls), 1);
    assert_eq!(FakeClient::count(&client.describe_calls), 1);
    assert_eq!(FakeClient::count(&client.instance_calls), 1);
}

#[tokio::test]
async fn test_refresh_snapshot_refetches_everything() {
    let prod = cluster("prod");
    let client = FakeClient {
        clusters: vec![prod.clone()],
        tasks: vec![task(&prod, 1, "web:3")],
        ..Default::default()
    };
    client.set_instances(vec![instance(&prod, "i-old")]);
    let mut cache = InventoryCache::new(client);

    let before = cache.get_snapshot(&prod).await.unwrap();
    assert_eq!(cache.get_containers(&prod)[0].ec2_instance_id, "i-old");

    cache
        .client()
        .set_instances(vec![instance(&prod, "i-new-b"), instance(&prod, "i-new-a")]);
    let after = cache.refresh_snapshot(&prod).await.unwrap();

    let containers = cache.get_containers(&prod);
    let ids: Vec<&str> = containers
        .iter()
        .map(|i| i.ec2_instance_id.as_str())
        .collect();
    assert_eq!(ids, vec!["i-new-a", "i-new-b"]);
    assert_eq!(after.instances.len(), 2);
    assert!(after.refreshed_at >= before.refreshed_at);

    // The earlier snapshot is untouched
    assert_eq!(before.instances[0].ec2_instance_id, "i-old");

    let client = cache.client();
    assert_eq!(FakeClient::count(&client.service_calls), 2);
    assert_eq!(FakeClient::count(&client.task_calls), 2);
    assert_eq!(FakeClient::count(&client.describe_calls), 2);
    assert_eq!(FakeClient::count(&client.instance_calls), 2);
}

#[tokio::test]
async fn test_list_clusters_prefetches_instances() {
    let a = cluster("a");
    let b = cluster("b");
    let client = FakeClient {
        clusters: vec![b.clone(), a.clone()],
        ..Default::default()
    };
    client.set_instances(vec![instance(&a, "i-a"), instance(&b, "i-b1"), instance(&b, "i-b2")]);
    let mut cache = InventoryCache::new(client);

    assert!(cache.get_containers(&a).is_empty());

    let clusters = cache.list_clusters().await.unwrap();
    assert_eq!(clusters.len(), 2);
    assert_eq!(FakeClient::count(&cache.client().instance_calls), 2);
    assert_eq!(cache.get_containers(&a).len(), 1);
    assert_eq!(cache.get_containers(&b).len(), 2);

    // Cached afterwards; opening a cluster reuses the prefetched instances
    cache.list_clusters().await.unwrap();
    cache.get_snapshot(&b).await.unwrap();
    assert_eq!(FakeClient::count(&cache.client().cluster_calls), 1);
    assert_eq!(FakeClient::count(&cache.client().instance_calls), 2);
}

#[tokio::test]
async fn test_results_are_sorted() {
    let clusters = vec![cluster("staging"), cluster("Prod"), cluster("dev")];
    let dev = clusters[2].clone();

    let client = FakeClient {
        clusters: clusters.clone(),
        services: vec![
            service(&dev, "worker", None),
            service(&dev, "api", None),
            service(&dev, "web", None),
        ],
        tasks: vec![
            task(&dev, 1, "web:1"),
            task(&dev, 2, "api:1"),
            task(&dev, 3, "web:1"),
            task(&dev, 4, "cron:9"),
        ],
        ..Default::default()
    };
    client.set_instances(vec![
        instance(&dev, "i-0c"),
        instance(&dev, "i-0a"),
        instance(&dev, "i-0b"),
    ]);
    let mut cache = InventoryCache::new(client);

    let names: Vec<String> = cache
        .list_clusters()
        .await
        .unwrap()
        .iter()
        .map(|c| c.name.clone())
        .collect();
    assert_eq!(names, vec!["Prod", "dev", "staging"]);

    let snapshot = cache.get_snapshot(&dev).await.unwrap();

    let services: Vec<&str> = snapshot.services.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(services, vec!["api", "web", "worker"]);

    // Ties keep the order the client returned them in
    let tasks: Vec<String> = snapshot.tasks.iter().map(|t| t.arn.clone()).collect();
    let expected: Vec<String> = [(2, "api:1"), (4, "cron:9"), (1, "web:1"), (3, "web:1")]
        .iter()
        .map(|(id, family)| task(&dev, *id, family).arn)
        .collect();
    assert_eq!(tasks, expected);

    let instances: Vec<&str> = snapshot
        .instances
        .iter()
        .map(|i| i.ec2_instance_id.as_str())
        .collect();
    assert_eq!(instances, vec!["i-0a", "i-0b", "i-0c"]);
}

#[tokio::test]
async fn test_refreshed_at_never_goes_backwards() {
    let prod = cluster("prod");
    let client = FakeClient {
        clusters: vec![prod.clone()],
        ..Default::default()
    };
    let mut cache = InventoryCache::new(client);

    let mut previous = cache.get_snapshot(&prod).await.unwrap().refreshed_at;
    for _ in 0..5 {
        let next = cache.refresh_snapshot(&prod).await.unwrap().refreshed_at;
        assert!(next >= previous);
        previous = next;
    }
}

#[tokio::test]
async fn test_failed_list_clusters_caches_nothing() {
    let prod = cluster("prod");
    let client = FakeClient {
        clusters: vec![prod.clone()],
        ..Default::default()
    };
    client.fail_instances.store(true, Ordering::SeqCst);
    let mut cache = InventoryCache::new(client);

    let err = cache.list_clusters().await.unwrap_err();
    assert!(err.is_credentials());
    assert_eq!(err.operation(), "ListContainerInstances");

    cache.client().fail_instances.store(false, Ordering::SeqCst);
    cache.list_clusters().await.unwrap();
    assert_eq!(FakeClient::count(&cache.client().cluster_calls), 2);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let prod = cluster("prod");
    let client = FakeClient {
        clusters: vec![prod.clone()],
        ..Default::default()
    };
    client.set_instances(vec![instance(&prod, "i-1")]);
    let mut cache = InventoryCache::new(client);

    let before = cache.get_snapshot(&prod).await.unwrap();

    cache.client().fail_instances.store(true, Ordering::SeqCst);
    assert!(cache.refresh_snapshot(&prod).await.is_err());

    // The instance entry was dropped by the refresh, the snapshot was not
    assert!(cache.get_containers(&prod).is_empty());
    let cached = cache.get_snapshot(&prod).await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&before, &cached));
}

#[tokio::test]
async fn test_get_containers_of_unknown_cluster_is_empty() {
    let cache = InventoryCache::new(FakeClient::default());
    assert!(cache.get_containers(&cluster("nowhere")).is_empty());
}
