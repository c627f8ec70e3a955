use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use log::{error, info, warn};
use tokio::sync::mpsc;

use crate::engine::models::{LauncherConfig, Manifest};
use crate::engine::state::{AppState, UserAction};
use crate::error::SyncError;
use crate::integrity::{self, ValidationReport};
use crate::jre::JavaLocator;
use crate::networking::NetworkClient;
use crate::process::ProcessLauncher;
use crate::storage::StorageManager;
use crate::sync::{ManifestSync, SyncSummary, Synchronizer};

pub mod models;
pub mod state;

/// Result of one update check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    UpToDate { version: String },
    Updated(SyncSummary),
    /// No manifest this cycle; nothing on disk was touched.
    Skipped(String),
}

/// Per-run overrides that are not written back to `launcher_config.json`.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub game_dir: Option<PathBuf>,
    pub server_url: Option<String>,
}

pub struct LauncherEngine<S = ManifestSync> {
    pub state: AppState,
    networking: NetworkClient,
    storage: StorageManager,
    process: ProcessLauncher,
    sync: S,
    overrides: Overrides,
}

impl LauncherEngine<ManifestSync> {
    pub fn new(storage: StorageManager, process: ProcessLauncher, networking: NetworkClient) -> Self {
        let sync = ManifestSync::new(networking.clone());
        Self::with_synchronizer(storage, process, networking, sync)
    }

    /// Engine wired from the persisted config: its timeout and Java override.
    pub async fn from_config(storage: StorageManager, overrides: Overrides) -> Self {
        let config = storage.load_config().await;
        let networking =
            NetworkClient::with_timeout(Duration::from_secs(config.request_timeout_secs.max(1)));
        let process = ProcessLauncher::new(JavaLocator::from_env());
        Self::new(storage, process, networking).with_overrides(overrides)
    }
}

impl<S: Synchronizer> LauncherEngine<S> {
    pub fn with_synchronizer(
        storage: StorageManager,
        process: ProcessLauncher,
        networking: NetworkClient,
        sync: S,
    ) -> Self {
        Self {
            state: AppState::Idle,
            networking,
            storage,
            process,
            sync,
            overrides: Overrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub async fn handle_action(
        &mut self,
        action: UserAction,
        updates: &mpsc::UnboundedSender<AppState>,
    ) {
        match action {
            UserAction::CheckForUpdates => {
                info!("action: CheckForUpdates");
                if let Err(err) = self.check_for_updates(updates).await {
                    self.fail(err.to_string(), updates);
                }
            }
            UserAction::ClickPlay => {
                info!("action: ClickPlay");
                self.play(updates).await;
            }
        }
    }

    /// Fetch → validate → download. An unreachable manifest is not an error:
    /// the cycle is skipped and local files stay as they are.
    pub async fn check_for_updates(
        &mut self,
        updates: &mpsc::UnboundedSender<AppState>,
    ) -> Result<SyncOutcome, SyncError> {
        let mut config = self.effective_config().await;
        let game_dir = self.game_dir(&config);
        crate::env::ensure_base_dirs_async(&game_dir).await?;

        self.publish(AppState::CheckingForUpdates, updates);
        let manifest = match self.networking.fetch_manifest(&config.manifest_endpoint()).await {
            Ok(manifest) => manifest,
            Err(SyncError::ManifestUnavailable(reason)) => {
                warn!("check_for_updates: skipping update ({reason})");
                self.publish(AppState::UpdateSkipped(reason.clone()), updates);
                return Ok(SyncOutcome::Skipped(reason));
            }
            Err(err) => return Err(err),
        };

        config.last_update_check = Some(Utc::now());
        self.persist_check_time(&config).await;

        let summary = self.sync.synchronize(&manifest, &game_dir, updates).await?;
        self.adopt_version(&manifest).await?;

        self.publish(
            AppState::ReadyToPlay {
                version: summary.version.clone(),
            },
            updates,
        );
        if summary.was_current() {
            Ok(SyncOutcome::UpToDate {
                version: summary.version,
            })
        } else {
            Ok(SyncOutcome::Updated(summary))
        }
    }

    /// Fetch the manifest and compare local files without downloading.
    pub async fn verify_files(&mut self, quick: bool) -> Result<VerifyResult, SyncError> {
        let config = self.effective_config().await;
        let game_dir = self.game_dir(&config);
        let manifest = self
            .networking
            .fetch_manifest(&config.manifest_endpoint())
            .await?;
        if quick {
            let valid = integrity::is_up_to_date(&manifest, &game_dir).await;
            Ok(VerifyResult::Quick {
                version: manifest.minecraft_version,
                valid,
            })
        } else {
            let report = integrity::inspect(&manifest, &game_dir).await;
            Ok(VerifyResult::Detailed {
                version: manifest.minecraft_version,
                report,
            })
        }
    }

    async fn play(&mut self, updates: &mpsc::UnboundedSender<AppState>) {
        let config = self.effective_config().await;
        if config.auto_update {
            if let Err(err) = self.check_for_updates(updates).await {
                self.fail(err.to_string(), updates);
                return;
            }
        } else {
            info!("play: auto update disabled; launching installed files");
        }

        let mut profile = self.storage.load_profile().await;
        let game_dir = self.game_dir(&config);
        self.publish(AppState::Launching, updates);
        match self.process.launch(&profile, &game_dir) {
            Ok(()) => {
                profile.last_used = Utc::now();
                if let Err(err) = self.storage.save_profile(&profile).await {
                    warn!("play: unable to record last use: {err}");
                }
                self.publish(AppState::Playing, updates);
                info!("game launched successfully");
            }
            Err(err) => {
                self.fail(err.to_string(), updates);
            }
        }
    }

    async fn effective_config(&self) -> LauncherConfig {
        let mut config = self.storage.load_config().await;
        if let Some(url) = &self.overrides.server_url {
            config.server_url = url.clone();
        }
        config
    }

    fn game_dir(&self, config: &LauncherConfig) -> PathBuf {
        match &self.overrides.game_dir {
            Some(dir) => dir.clone(),
            None => config.game_dir_or(self.storage.base_dir()),
        }
    }

    async fn persist_check_time(&self, config: &LauncherConfig) {
        // Overrides are per-run; only the timestamp goes back to disk.
        let mut stored = self.storage.load_config().await;
        stored.last_update_check = config.last_update_check;
        if let Err(err) = self.storage.save_config(&stored).await {
            warn!("check_for_updates: unable to record check time: {err}");
        }
    }

    async fn adopt_version(&self, manifest: &Manifest) -> Result<(), SyncError> {
        let mut profile = self.storage.load_profile().await;
        if profile.minecraft_version != manifest.minecraft_version {
            info!(
                "check_for_updates: profile version {} -> {}",
                profile.minecraft_version, manifest.minecraft_version
            );
            profile.minecraft_version = manifest.minecraft_version.clone();
            self.storage.save_profile(&profile).await?;
        }
        Ok(())
    }

    fn publish(&mut self, state: AppState, updates: &mpsc::UnboundedSender<AppState>) {
        self.state = state.clone();
        let _ = updates.send(state);
    }

    fn fail(&mut self, message: String, updates: &mpsc::UnboundedSender<AppState>) {
        error!("engine: {message}");
        self.publish(AppState::Error(message), updates);
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    pub fn resolved_game_dir(&self, config: &LauncherConfig) -> PathBuf {
        self.game_dir(config)
    }
}

#[derive(Clone, Debug)]
pub enum VerifyResult {
    Quick { version: String, valid: bool },
    Detailed { version: String, report: ValidationReport },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        match self {
            VerifyResult::Quick { valid, .. } => *valid,
            VerifyResult::Detailed { report, .. } => report.is_valid(),
        }
    }
}
