use std::future::Future;
use std::path::Path;

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::engine::models::Manifest;
use crate::engine::state::AppState;
use crate::error::SyncError;
use crate::integrity;
use crate::networking::NetworkClient;

/// What a synchronization pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub version: String,
    pub checked: usize,
    pub downloaded: Vec<String>,
}

impl SyncSummary {
    pub fn was_current(&self) -> bool {
        self.downloaded.is_empty()
    }
}

/// Brings the files under a game directory in line with a manifest.
pub trait Synchronizer {
    fn synchronize(
        &self,
        manifest: &Manifest,
        game_dir: &Path,
        updates: &mpsc::UnboundedSender<AppState>,
    ) -> impl Future<Output = Result<SyncSummary, SyncError>> + Send;
}

/// Validates by hash, then downloads stale entries one at a time. Stops at
/// the first failure; files fetched before it stay in place.
#[derive(Clone)]
pub struct ManifestSync {
    networking: NetworkClient,
}

impl ManifestSync {
    pub fn new(networking: NetworkClient) -> Self {
        Self { networking }
    }
}

impl Synchronizer for ManifestSync {
    async fn synchronize(
        &self,
        manifest: &Manifest,
        game_dir: &Path,
        updates: &mpsc::UnboundedSender<AppState>,
    ) -> Result<SyncSummary, SyncError> {
        let _ = updates.send(AppState::ValidatingFiles);
        let report = integrity::inspect(manifest, game_dir).await;
        let mut summary = SyncSummary {
            version: manifest.minecraft_version.clone(),
            checked: manifest.entry_count(),
            downloaded: Vec::new(),
        };

        if let Some(bad) = report.rejected().next() {
            warn!("sync: refusing manifest with entry {:?}", bad.entry.name);
            return Err(SyncError::InvalidEntryName(bad.entry.name.clone()));
        }
        if report.is_valid() {
            info!("sync: all {} files up to date", summary.checked);
            return Ok(summary);
        }

        let stale: Vec<_> = report.stale().collect();
        let count = stale.len();
        info!("sync: {count} of {} files need downloading", summary.checked);

        for (index, file) in stale.into_iter().enumerate() {
            let name = file.entry.name.clone();
            debug!(
                "sync: fetching {} {} from {}",
                file.category.label(),
                name,
                file.entry.url
            );
            let _ = updates.send(AppState::Downloading {
                file: name.clone(),
                index,
                count,
                progress: None,
            });
            self.networking
                .download_verified(&file.entry.url, &file.path, &file.entry.hash, |pct| {
                    let _ = updates.send(AppState::Downloading {
                        file: name.clone(),
                        index,
                        count,
                        progress: Some(pct),
                    });
                })
                .await?;
            summary.downloaded.push(name);
        }

        info!("sync: downloaded {} files", summary.downloaded.len());
        Ok(summary)
    }
}
