/// Configuration constants for the application
pub mod config {
    /// Default kubeconfig identifier
    pub const DEFAULT_KUBECONFIG: &str = "default";

    /// Directory, relative to home, holding named kubeconfig files
    pub const KUBECONFIG_STORAGE_DIR: &str = ".rspods/kubeconfigs";

    pub const KUBECONFIG_FILE_EXTENSION: &str = ".yaml";

    /// Characters to replace in file names for safety
    pub const UNSAFE_FILENAME_CHARS: &[char] = &['/', '\\', ':'];

    /// Replacement character for unsafe filename characters
    pub const FILENAME_REPLACEMENT_CHAR: char = '_';
}

/// Utility functions for file operations
pub mod file_utils {
    use super::config::*;
    use std::path::{Path, PathBuf};

    /// Get the kubeconfig storage directory path
    pub fn get_kubeconfig_storage_dir() -> Result<PathBuf, std::io::Error> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "Home directory not found"))?;

        Ok(kubeconfig_storage_dir_in(&home_dir))
    }

    /// Kubeconfig storage directory below a given home directory
    pub fn kubeconfig_storage_dir_in(home_dir: &Path) -> PathBuf {
        home_dir.join(KUBECONFIG_STORAGE_DIR)
    }

    /// Sanitize a filename by replacing unsafe characters
    pub fn sanitize_filename(name: &str) -> String {
        name.chars()
            .map(|c| {
                if UNSAFE_FILENAME_CHARS.contains(&c) {
                    FILENAME_REPLACEMENT_CHAR
                } else {
                    c
                }
            })
            .collect()
    }
}

/// Utility functions for time and age calculations
pub mod time_utils {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use k8s_openapi::chrono::{DateTime, Utc};

    /// Formats a duration in seconds into a compact string (e.g. "2d", "5h", "30m")
    pub fn format_duration(seconds: i64) -> String {
        let seconds = seconds.max(0);
        if seconds < 60 {
            format!("{}s", seconds)
        } else if seconds < 3600 {
            format!("{}m", seconds / 60)
        } else if seconds < 86400 {
            format!("{}h", seconds / 3600)
        } else {
            format!("{}d", seconds / 86400)
        }
    }

    /// Age of a start time relative to `now`, or `<none>` if not started
    pub fn calculate_age_at(start_time: Option<&Time>, now: DateTime<Utc>) -> String {
        match start_time {
            Some(time) => format_duration(now.signed_duration_since(time.0).num_seconds()),
            None => "<none>".to_string(),
        }
    }

    pub fn calculate_age(start_time: Option<&Time>) -> String {
        calculate_age_at(start_time, Utc::now())
    }
}

pub use time_utils::calculate_age;
