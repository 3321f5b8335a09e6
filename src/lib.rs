//! Ranks the pods of a replica set by how often their containers restarted.

pub mod contexts;
pub mod k8s;
pub mod logging;
pub mod utils;

pub use k8s::{
    aggregate_pods, get_replica_set_pods, rank_and_limit, PodContainer, PodSource,
    ReplicaSetPodFetcher, ReplicaSetPodWithContainers, ReplicaSetPods,
};
