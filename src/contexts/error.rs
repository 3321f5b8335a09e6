use thiserror::Error;

/// Errors raised while turning a kubeconfig reference into a client
#[derive(Error, Debug)]
pub enum KubeconfigError {
    /// Neither a stored kubeconfig nor a file matches the given reference
    #[error("Kubeconfig not found: {0}")]
    NotFound(String),
    /// A stored kubeconfig points at a file that no longer exists
    #[error("File not found: {0}")]
    FileNotFound(String),
    /// The kubeconfig could not be parsed
    #[error("Invalid kubeconfig content: {0}")]
    InvalidContent(String),
    /// The client could not be built from a valid kubeconfig
    #[error("Client creation failed: {0}")]
    ClientCreationError(#[from] kube::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for kubeconfig operations
pub type KubeconfigResult<T> = Result<T, KubeconfigError>;
