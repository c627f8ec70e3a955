use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;

use crate::engine::models::{GameProfile, LauncherConfig};
use crate::env;
use crate::error::StorageError;

const CONFIG_FILE: &str = "launcher_config.json";
const PROFILES_FILE: &str = "launcher_profiles.json";

/// Owns the launcher root: its directory layout and the two JSON documents.
#[derive(Clone)]
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn at_default_location() -> Self {
        Self::new(env::default_game_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE)
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.base_dir.join(PROFILES_FILE)
    }

    pub fn ensure_layout(&self) -> Result<(), StorageError> {
        env::ensure_base_dirs(&self.base_dir)
    }

    /// Load settings; a missing file is created with defaults, a corrupt one
    /// is ignored in favour of defaults.
    pub async fn load_config(&self) -> LauncherConfig {
        let path = self.config_path();
        let defaults = LauncherConfig {
            game_directory: self.base_dir.display().to_string(),
            ..LauncherConfig::default()
        };
        self.load_or_default(&path, defaults).await
    }

    pub async fn save_config(&self, config: &LauncherConfig) -> Result<(), StorageError> {
        write_json(&self.config_path(), config).await
    }

    pub async fn load_profile(&self) -> GameProfile {
        let path = self.profiles_path();
        let defaults = GameProfile {
            game_directory: self.base_dir.display().to_string(),
            ..GameProfile::default()
        };
        self.load_or_default(&path, defaults).await
    }

    pub async fn save_profile(&self, profile: &GameProfile) -> Result<(), StorageError> {
        write_json(&self.profiles_path(), profile).await
    }

    async fn load_or_default<T>(&self, path: &Path, defaults: T) -> T
    where
        T: Serialize + DeserializeOwned,
    {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("storage: {} missing; writing defaults", path.display());
                if let Err(err) = write_json(path, &defaults).await {
                    warn!("storage: {err}");
                }
                return defaults;
            }
            Err(err) => {
                warn!("storage: unable to read {} ({err}); using defaults", path.display());
                return defaults;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => {
                warn!("storage: {} is corrupt ({err}); using defaults", path.display());
                defaults
            }
        }
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| StorageError::new("serialize", path, std::io::Error::other(e)))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::new("create directory", parent, e))?;
    }
    fs::write(path, &bytes)
        .await
        .map_err(|e| StorageError::new("write", path, e))
}
