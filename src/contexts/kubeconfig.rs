use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::{Path, PathBuf};

use super::error::{KubeconfigError, KubeconfigResult};
use crate::utils::{config, file_utils};

/// Kubeconfig files saved under a name, one `<name>.yaml` per entry
#[derive(Clone, Debug)]
pub struct KubeconfigStorage {
    dir: PathBuf,
}

impl KubeconfigStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage rooted in the user's home directory
    pub fn from_home() -> KubeconfigResult<Self> {
        Ok(Self::new(file_utils::get_kubeconfig_storage_dir()?))
    }

    /// Path a kubeconfig stored under `name` lives at
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!(
            "{}{}",
            file_utils::sanitize_filename(name),
            config::KUBECONFIG_FILE_EXTENSION
        ))
    }

    /// Retrieve kubeconfig file path by name, if one is stored
    pub fn get_file_path(&self, name: &str) -> Option<PathBuf> {
        let path = self.file_path(name);
        path.is_file().then_some(path)
    }
}

/// Where a client's configuration comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KubeconfigSource {
    /// In-cluster config or `~/.kube/config`
    Default,
    File(PathBuf),
}

/// Resolves a kubeconfig reference: `default`, a stored name, or a file path.
/// Stored names win over paths.
pub fn resolve_kubeconfig(
    name_or_path: &str,
    storage: Option<&KubeconfigStorage>,
) -> KubeconfigResult<KubeconfigSource> {
    if name_or_path == config::DEFAULT_KUBECONFIG {
        return Ok(KubeconfigSource::Default);
    }

    if let Some(stored) = storage.and_then(|s| s.get_file_path(name_or_path)) {
        return Ok(KubeconfigSource::File(stored));
    }

    if Path::new(name_or_path).is_file() {
        Ok(KubeconfigSource::File(PathBuf::from(name_or_path)))
    } else {
        Err(KubeconfigError::NotFound(name_or_path.to_string()))
    }
}

/// Create a Kubernetes client from a kubeconfig reference
pub async fn create_client(name_or_path: &str) -> KubeconfigResult<Client> {
    // The storage dir is optional; a missing home only disables stored names.
    let storage = match KubeconfigStorage::from_home() {
        Ok(storage) => Some(storage),
        Err(e) => {
            tracing::warn!("Kubeconfig storage unavailable: {}", e);
            None
        }
    };

    match resolve_kubeconfig(name_or_path, storage.as_ref())? {
        KubeconfigSource::Default => Ok(Client::try_default().await?),
        KubeconfigSource::File(path) => create_client_from_file_path(&path).await,
    }
}

async fn create_client_from_file_path(path: &Path) -> KubeconfigResult<Client> {
    if !path.exists() {
        return Err(KubeconfigError::FileNotFound(path.display().to_string()));
    }
    tracing::debug!(path = %path.display(), "loading kubeconfig");

    let kubeconfig = Kubeconfig::read_from(path)
        .map_err(|e| KubeconfigError::InvalidContent(format!("{}: {}", path.display(), e)))?;
    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| KubeconfigError::InvalidContent(format!("{}: {}", path.display(), e)))?;

    Ok(Client::try_from(config)?)
}
