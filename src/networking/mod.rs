use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use log::{debug, info, warn};
use reqwest::Client;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::engine::models::Manifest;
use crate::error::{StorageError, SyncError};
use crate::integrity;
use crate::util::progress_percent;

/// Bytes written (and reported) per step of a download.
pub const CHUNK_SIZE: usize = 8 * 1024;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

const PART_SUFFIX: &str = ".part";

#[derive(Clone)]
pub struct NetworkClient {
    client: Client,
}

impl Default for NetworkClient {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("craft-launcher/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|err| {
                warn!("network client: falling back to default HTTP client configuration ({err})");
                Client::new()
            });
        Self { client }
    }

    /// Fetch the version manifest. Single attempt; any failure is `ManifestUnavailable`.
    pub async fn fetch_manifest(&self, endpoint: &str) -> Result<Manifest, SyncError> {
        info!("fetch_manifest: requesting {endpoint}");
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| SyncError::ManifestUnavailable(format!("request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(SyncError::ManifestUnavailable(format!(
                "server returned status {}",
                response.status()
            )));
        }
        let manifest: Manifest = response
            .json()
            .await
            .map_err(|e| SyncError::ManifestUnavailable(format!("invalid manifest: {e}")))?;
        debug!(
            "fetch_manifest: version {} with {} client files and {} mods",
            manifest.minecraft_version,
            manifest.client_files.len(),
            manifest.mods.len()
        );
        Ok(manifest)
    }

    /// Download `url` to `dest`, calling `progress` with whole percents when
    /// the size is known. `dest` is only replaced once the body is complete.
    pub async fn download_to_path<F>(
        &self,
        url: &str,
        dest: &Path,
        progress: F,
    ) -> Result<u64, SyncError>
    where
        F: FnMut(u8),
    {
        let part = part_path(url, dest)?;
        let written = self.stream_to(url, &part, progress).await;
        let downloaded = discard_on_error(&part, written).await?;
        promote(&part, dest).await?;
        info!("download: {} ({} bytes)", dest.display(), downloaded);
        Ok(downloaded)
    }

    /// Like [`download_to_path`](Self::download_to_path), but the bytes must
    /// hash to `expected_hash` before they replace `dest`.
    pub async fn download_verified<F>(
        &self,
        url: &str,
        dest: &Path,
        expected_hash: &str,
        progress: F,
    ) -> Result<u64, SyncError>
    where
        F: FnMut(u8),
    {
        let part = part_path(url, dest)?;
        let written = self.stream_to(url, &part, progress).await;
        let downloaded = discard_on_error(&part, written).await?;

        let expected = expected_hash.trim().to_ascii_lowercase();
        let actual = match integrity::file_sha256_async(&part).await {
            Ok(actual) => actual,
            Err(err) => {
                let _ = fs::remove_file(&part).await;
                return Err(SyncError::download(url, format!("unable to hash download: {err}")));
            }
        };
        if actual != expected {
            warn!(
                "download: {} hashed to {actual}, expected {expected}",
                dest.display()
            );
            let _ = fs::remove_file(&part).await;
            return Err(SyncError::CorruptDownload {
                name: display_name(dest),
                expected,
                actual,
            });
        }

        promote(&part, dest).await?;
        info!("download: {} verified ({} bytes)", dest.display(), downloaded);
        Ok(downloaded)
    }

    async fn stream_to<F>(&self, url: &str, part: &Path, mut progress: F) -> Result<u64, SyncError>
    where
        F: FnMut(u8),
    {
        if let Some(parent) = part.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::new("create directory", parent, e))?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SyncError::download(url, format!("request failed: {e}")))?
            .error_for_status()
            .map_err(|e| SyncError::download(url, format!("bad status: {e}")))?;

        let mut file = File::create(part)
            .await
            .map_err(|e| StorageError::new("create file", part, e))?;

        let total = response.content_length();
        debug!("download: {url} -> {} (length {:?})", part.display(), total);
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| SyncError::download(url, format!("stream error: {e}")))?;
            for piece in chunk.chunks(CHUNK_SIZE) {
                file.write_all(piece)
                    .await
                    .map_err(|e| SyncError::download(url, format!("write error: {e}")))?;
                downloaded += piece.len() as u64;
                if let Some(pct) = progress_percent(downloaded, total) {
                    progress(pct);
                }
            }
        }

        file.flush()
            .await
            .map_err(|e| SyncError::download(url, format!("flush error: {e}")))?;

        if let Some(total) = total
            && downloaded < total
        {
            return Err(SyncError::download(
                url,
                format!("incomplete body: received {downloaded} of {total} bytes"),
            ));
        }

        Ok(downloaded)
    }
}

fn part_path(url: &str, dest: &Path) -> Result<PathBuf, SyncError> {
    let name = dest
        .file_name()
        .ok_or_else(|| SyncError::download(url, "destination has no file name"))?;
    let mut part_name = name.to_os_string();
    part_name.push(PART_SUFFIX);
    Ok(dest.with_file_name(part_name))
}

async fn discard_on_error(part: &Path, result: Result<u64, SyncError>) -> Result<u64, SyncError> {
    if result.is_err() {
        let _ = fs::remove_file(part).await;
    }
    result
}

async fn promote(part: &Path, dest: &Path) -> Result<(), SyncError> {
    if let Err(err) = fs::rename(part, dest).await {
        let _ = fs::remove_file(part).await;
        return Err(StorageError::new("move download into", dest, err).into());
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
