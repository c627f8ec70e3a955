use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

const GAME_DIR_NAME: &str = ".minecraft_custom";

/// Returns the root directory used by the launcher when none is configured.
pub fn default_game_dir() -> PathBuf {
    let base = match env::consts::OS {
        "windows" => env::var_os("APPDATA")
            .or_else(|| env::var_os("LOCALAPPDATA"))
            .map(PathBuf::from),
        "macos" => env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join("Library").join("Application Support")),
        _ => env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join(".local").join("share")),
    }
    .unwrap_or_else(|| PathBuf::from("."));

    base.join(GAME_DIR_NAME)
}

pub fn versions_dir(root: &Path) -> PathBuf {
    root.join("versions")
}

pub fn version_dir(root: &Path, version: &str) -> PathBuf {
    versions_dir(root).join(version)
}

pub fn mods_dir(root: &Path) -> PathBuf {
    root.join("mods")
}

pub fn assets_dir(root: &Path) -> PathBuf {
    root.join("assets")
}

pub fn logs_dir(root: &Path) -> PathBuf {
    root.join("logs")
}

fn layout(root: &Path) -> [PathBuf; 5] {
    [
        root.to_path_buf(),
        versions_dir(root),
        mods_dir(root),
        assets_dir(root),
        logs_dir(root),
    ]
}

/// Create the on-disk folder layout expected by the launcher.
pub fn ensure_base_dirs(root: &Path) -> Result<(), StorageError> {
    for dir in layout(root) {
        fs::create_dir_all(&dir).map_err(|e| StorageError::new("create directory", dir, e))?;
    }
    Ok(())
}

/// [`ensure_base_dirs`] for use on the async runtime.
pub async fn ensure_base_dirs_async(root: &Path) -> Result<(), StorageError> {
    for dir in layout(root) {
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::new("create directory", dir, e))?;
    }
    Ok(())
}
