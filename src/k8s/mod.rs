pub mod fetch;
pub mod replicaset_pods;

pub use fetch::*;
pub use replicaset_pods::*;
