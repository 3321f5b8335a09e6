// Cluster connection setup
pub mod error;
pub mod kubeconfig;

pub use error::*;
pub use kubeconfig::*;
