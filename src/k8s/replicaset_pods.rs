use futures::future::BoxFuture;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use serde::Serialize;

/// Information about a container that belongs to a pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodContainer {
    pub name: String,
    pub restart_count: i32,
}

/// A replica set pod together with the restart statistics of its containers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaSetPodWithContainers {
    pub name: String,
    /// Time the pod has started. `None` if not started.
    pub start_time: Option<Time>,
    total_restart_count: i64,
    pod_containers: Vec<PodContainer>,
}

impl ReplicaSetPodWithContainers {
    /// Builds a pod record; the total is always derived from the containers.
    pub fn new(name: String, start_time: Option<Time>, pod_containers: Vec<PodContainer>) -> Self {
        let total_restart_count = pod_containers
            .iter()
            .map(|c| i64::from(c.restart_count))
            .sum();
        Self {
            name,
            start_time,
            total_restart_count,
            pod_containers,
        }
    }

    pub fn total_restart_count(&self) -> i64 {
        self.total_restart_count
    }

    /// Containers in the order the cluster reported their statuses.
    pub fn pod_containers(&self) -> &[PodContainer] {
        &self.pod_containers
    }
}

/// Pods of a replica set, most restarted first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplicaSetPods {
    pub pods: Vec<ReplicaSetPodWithContainers>,
}

/// Supplies the raw pods selected by a replica set.
pub trait PodSource {
    type Error;

    fn fetch_raw_pods<'a>(
        &'a self,
        namespace: &'a str,
        replica_set: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Pod>, Self::Error>>;
}

/// Turns raw pods into records carrying per-container and total restart counts.
pub fn aggregate_pods(pods: &[Pod]) -> Vec<ReplicaSetPodWithContainers> {
    pods.iter().map(pod_with_containers).collect()
}

fn pod_with_containers(pod: &Pod) -> ReplicaSetPodWithContainers {
    let status = pod.status.as_ref();
    let containers = status
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| {
            statuses
                .iter()
                .map(|cs| PodContainer {
                    name: cs.name.clone(),
                    restart_count: cs.restart_count,
                })
                .collect()
        })
        .unwrap_or_default();

    ReplicaSetPodWithContainers::new(
        pod.metadata.name.clone().unwrap_or_default(),
        status.and_then(|s| s.start_time.clone()),
        containers,
    )
}

/// Sorts pods by total restarts, descending, keeping input order among ties.
/// A `limit` of zero or less returns every pod.
pub fn rank_and_limit(
    mut pods: Vec<ReplicaSetPodWithContainers>,
    limit: i64,
) -> Vec<ReplicaSetPodWithContainers> {
    // sort_by_key is stable
    pods.sort_by_key(|p| std::cmp::Reverse(p.total_restart_count));

    if let Ok(limit) = usize::try_from(limit) {
        if limit > 0 {
            pods.truncate(limit);
        }
    }
    pods
}

/// Returns the pods of the given replica set ranked by restarts and bounded
/// to `limit` entries. Failures of the source are returned as-is.
pub async fn get_replica_set_pods<S: PodSource>(
    source: &S,
    namespace: &str,
    name: &str,
    limit: i64,
) -> Result<ReplicaSetPods, S::Error> {
    let raw = source.fetch_raw_pods(namespace, name).await?;
    tracing::debug!(
        namespace,
        replica_set = name,
        fetched = raw.len(),
        limit,
        "ranking replica set pods"
    );

    let pods = rank_and_limit(aggregate_pods(&raw), limit);
    Ok(ReplicaSetPods { pods })
}
