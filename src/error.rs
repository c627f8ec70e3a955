use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A filesystem operation on the launcher's own directories failed.
#[derive(Debug, Error)]
#[error("failed to {action} {}: {source}", .path.display())]
pub struct StorageError {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl StorageError {
    pub fn new(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Failures of the fetch → validate → download flow.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The manifest could not be fetched or parsed. Callers skip the update
    /// and leave local files untouched.
    #[error("update information unavailable: {0}")]
    ManifestUnavailable(String),

    #[error("download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// The downloaded bytes do not hash to the manifest value.
    #[error("{name} failed verification: expected {expected}, got {actual}")]
    CorruptDownload {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("manifest entry {0:?} does not name a file inside the game directory")]
    InvalidEntryName(String),

    #[error(transparent)]
    LocalStorage(#[from] StorageError),
}

impl SyncError {
    pub fn download(url: &str, reason: impl std::fmt::Display) -> Self {
        SyncError::DownloadFailed {
            url: url.to_owned(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Java runtime not found; install Java or set JAVA_HOME")]
    JavaNotFound,

    #[error("game client not found at {}", .0.display())]
    ClientMissing(PathBuf),

    #[error("failed to start game process: {0}")]
    Spawn(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_names_action_and_path() {
        let err = StorageError::new(
            "create directory",
            "/tmp/game/mods",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("create directory"));
        assert!(msg.contains("/tmp/game/mods"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn local_storage_is_transparent() {
        let err: SyncError = StorageError::new(
            "write",
            "launcher_config.json",
            io::Error::other("disk full"),
        )
        .into();
        assert_eq!(
            err.to_string(),
            "failed to write launcher_config.json: disk full"
        );
    }

    #[test]
    fn download_failure_mentions_url() {
        let err = SyncError::download("http://x/a.jar", "status 500");
        assert_eq!(err.to_string(), "download of http://x/a.jar failed: status 500");
    }

    #[test]
    fn missing_client_shows_path() {
        let err = LaunchError::ClientMissing(PathBuf::from("versions/1.20.1/minecraft-1.20.1.jar"));
        assert!(err.to_string().contains("minecraft-1.20.1.jar"));
    }
}
