use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::env;
use crate::error::SyncError;

/// Server-declared file set for one game version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub minecraft_version: String,
    /// Aggregate hash published by the server. Stored only.
    #[serde(default)]
    pub mods_hash: String,
    #[serde(default)]
    pub client_files: Vec<FileEntry>,
    #[serde(default)]
    pub mods: Vec<FileEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub url: String,
    pub hash: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileCategory {
    Client,
    Mod,
}

impl FileCategory {
    pub fn label(self) -> &'static str {
        match self {
            FileCategory::Client => "client",
            FileCategory::Mod => "mod",
        }
    }
}

impl Manifest {
    /// Client files followed by mods, each in manifest order.
    pub fn entries(&self) -> impl Iterator<Item = (FileCategory, &FileEntry)> {
        self.client_files
            .iter()
            .map(|entry| (FileCategory::Client, entry))
            .chain(self.mods.iter().map(|entry| (FileCategory::Mod, entry)))
    }

    pub fn entry_count(&self) -> usize {
        self.client_files.len() + self.mods.len()
    }

    /// Where `entry` lives under `game_dir`.
    ///
    /// Names and the version tag must be plain relative paths; anything that
    /// could climb out of the category directory is rejected.
    pub fn resolve(
        &self,
        category: FileCategory,
        entry: &FileEntry,
        game_dir: &Path,
    ) -> Result<PathBuf, SyncError> {
        let name = relative_path(&entry.name)
            .ok_or_else(|| SyncError::InvalidEntryName(entry.name.clone()))?;
        let base = match category {
            FileCategory::Client => {
                let version = relative_path(&self.minecraft_version)
                    .ok_or_else(|| SyncError::InvalidEntryName(self.minecraft_version.clone()))?;
                env::versions_dir(game_dir).join(version)
            }
            FileCategory::Mod => env::mods_dir(game_dir),
        };
        Ok(base.join(name))
    }
}

impl FileEntry {
    /// Manifest hash in the form computed locally.
    pub fn normalized_hash(&self) -> String {
        self.hash.trim().to_ascii_lowercase()
    }
}

fn relative_path(raw: &str) -> Option<&Path> {
    let path = Path::new(raw);
    let mut components = path.components().peekable();
    components.peek()?;
    components
        .all(|component| matches!(component, Component::Normal(_)))
        .then_some(path)
}

/// Persisted launcher settings (`launcher_config.json`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub server_url: String,
    pub launcher_version: String,
    /// Gates the update check before launching.
    pub auto_update: bool,
    /// Kept for compatibility with existing config files. Stored only;
    /// `auto_update` decides whether play checks for updates.
    pub check_updates_on_startup: bool,
    pub game_directory: String,
    pub last_update_check: Option<DateTime<Utc>>,
    pub request_timeout_secs: u64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            server_url: "http://yourserver.com".into(),
            launcher_version: env!("CARGO_PKG_VERSION").into(),
            auto_update: true,
            check_updates_on_startup: true,
            game_directory: String::new(),
            last_update_check: None,
            request_timeout_secs: 300,
        }
    }
}

impl LauncherConfig {
    pub fn manifest_endpoint(&self) -> String {
        format!("{}/api/version", self.server_url.trim_end_matches('/'))
    }

    /// Configured game directory, or `fallback` when unset.
    pub fn game_dir_or(&self, fallback: &Path) -> PathBuf {
        if self.game_directory.trim().is_empty() {
            fallback.to_path_buf()
        } else {
            PathBuf::from(self.game_directory.trim())
        }
    }
}

/// The active game profile (`launcher_profiles.json`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameProfile {
    pub name: String,
    pub game_directory: String,
    pub minecraft_version: String,
    pub java_path: String,
    pub player_name: String,
    pub max_memory: String,
    pub min_memory: String,
    pub launcher_version: String,
    pub last_used: DateTime<Utc>,
    pub is_default: bool,
}

impl Default for GameProfile {
    fn default() -> Self {
        Self {
            name: "Default".into(),
            game_directory: String::new(),
            minecraft_version: "1.20.1".into(),
            java_path: String::new(),
            player_name: "Player".into(),
            max_memory: "2G".into(),
            min_memory: "1G".into(),
            launcher_version: env!("CARGO_PKG_VERSION").into(),
            last_used: Utc::now(),
            is_default: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> FileEntry {
        FileEntry {
            name: name.into(),
            url: format!("http://x/{name}"),
            hash: "AB".into(),
        }
    }

    fn manifest() -> Manifest {
        Manifest {
            minecraft_version: "1.20.1".into(),
            mods_hash: String::new(),
            client_files: vec![entry("a.jar"), entry("b.jar")],
            mods: vec![entry("m.jar")],
        }
    }

    #[test]
    fn parses_wire_format() {
        let json = r#"{
            "minecraft_version": "1.20.1",
            "mods_hash": "abc",
            "client_files": [{"name": "a.jar", "url": "http://x/a.jar", "hash": "00"}],
            "mods": []
        }"#;
        let parsed: Manifest = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.minecraft_version, "1.20.1");
        assert_eq!(parsed.mods_hash, "abc");
        assert_eq!(parsed.client_files[0].url, "http://x/a.jar");
        assert!(parsed.mods.is_empty());
    }

    #[test]
    fn optional_lists_default_to_empty() {
        let parsed: Manifest = serde_json::from_str(r#"{"minecraft_version": "1.19"}"#).unwrap();
        assert_eq!(parsed.entry_count(), 0);
        assert!(serde_json::from_str::<Manifest>(r#"{"mods": []}"#).is_err());
    }

    #[test]
    fn entries_list_client_files_first() {
        let m = manifest();
        let order: Vec<_> = m
            .entries()
            .map(|(category, e)| (category, e.name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (FileCategory::Client, "a.jar"),
                (FileCategory::Client, "b.jar"),
                (FileCategory::Mod, "m.jar"),
            ]
        );
    }

    #[test]
    fn resolves_category_directories() {
        let m = manifest();
        let root = Path::new("/games/root");
        assert_eq!(
            m.resolve(FileCategory::Client, &m.client_files[0], root).unwrap(),
            root.join("versions").join("1.20.1").join("a.jar")
        );
        assert_eq!(
            m.resolve(FileCategory::Mod, &m.mods[0], root).unwrap(),
            root.join("mods").join("m.jar")
        );
    }

    #[test]
    fn rejects_names_escaping_the_game_dir() {
        let mut m = manifest();
        let root = Path::new("/games/root");
        for bad in ["../evil.jar", "/etc/passwd", "", "mods/../../x"] {
            let e = entry(bad);
            assert!(matches!(
                m.resolve(FileCategory::Mod, &e, root),
                Err(SyncError::InvalidEntryName(_))
            ));
        }
        m.minecraft_version = "..".into();
        assert!(m.resolve(FileCategory::Client, &entry("a.jar"), root).is_err());
        assert!(m.resolve(FileCategory::Mod, &entry("libs/x.jar"), root).is_ok());
    }

    #[test]
    fn normalizes_manifest_hash() {
        let e = FileEntry {
            name: "a".into(),
            url: "u".into(),
            hash: " ABCdef \n".into(),
        };
        assert_eq!(e.normalized_hash(), "abcdef");
    }

    #[test]
    fn builds_manifest_endpoint() {
        let mut config = LauncherConfig::default();
        assert_eq!(config.manifest_endpoint(), "http://yourserver.com/api/version");
        config.server_url = "https://mc.example.org/".into();
        assert_eq!(config.manifest_endpoint(), "https://mc.example.org/api/version");
    }

    #[test]
    fn config_fills_missing_keys_with_defaults() {
        let config: LauncherConfig =
            serde_json::from_str(r#"{"server_url": "http://other"}"#).unwrap();
        assert_eq!(config.server_url, "http://other");
        assert!(config.auto_update);
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.game_dir_or(Path::new("/fallback")), PathBuf::from("/fallback"));
    }
}
