use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use sha2::{Digest, Sha256};

use crate::engine::models::{FileCategory, FileEntry, Manifest};

const HASH_BUFFER: usize = 8192;

/// Lowercase hex SHA-256 of the file at `path`, read in fixed-size blocks.
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_BUFFER];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Async wrapper that keeps hashing off the runtime threads.
pub async fn file_sha256_async(path: &Path) -> io::Result<String> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || file_sha256(&owned))
        .await
        .map_err(io::Error::other)?
}

/// Per-entry outcome of comparing a local file with the manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryStatus {
    Ok,
    Missing,
    /// `actual` is `None` when the file exists but could not be read.
    Mismatched { actual: Option<String> },
    InvalidName,
}

#[derive(Clone, Debug)]
pub struct LocalFile {
    pub category: FileCategory,
    pub entry: FileEntry,
    /// Empty for entries whose name was rejected.
    pub path: PathBuf,
    pub status: EntryStatus,
}

/// Structured validation result, one row per manifest entry in manifest order.
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    pub files: Vec<LocalFile>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.files.iter().all(|f| f.status == EntryStatus::Ok)
    }

    pub fn ok(&self) -> impl Iterator<Item = &LocalFile> {
        self.with_status(|s| matches!(s, EntryStatus::Ok))
    }

    pub fn missing(&self) -> impl Iterator<Item = &LocalFile> {
        self.with_status(|s| matches!(s, EntryStatus::Missing))
    }

    pub fn mismatched(&self) -> impl Iterator<Item = &LocalFile> {
        self.with_status(|s| matches!(s, EntryStatus::Mismatched { .. }))
    }

    pub fn rejected(&self) -> impl Iterator<Item = &LocalFile> {
        self.with_status(|s| matches!(s, EntryStatus::InvalidName))
    }

    /// Entries that need a download: missing or mismatched.
    pub fn stale(&self) -> impl Iterator<Item = &LocalFile> {
        self.with_status(|s| matches!(s, EntryStatus::Missing | EntryStatus::Mismatched { .. }))
    }

    fn with_status(&self, pred: fn(&EntryStatus) -> bool) -> impl Iterator<Item = &LocalFile> {
        self.files.iter().filter(move |f| pred(&f.status))
    }
}

fn check_entry(path: &Path, entry: &FileEntry) -> EntryStatus {
    if !path.is_file() {
        return EntryStatus::Missing;
    }
    match file_sha256(path) {
        Ok(actual) if actual == entry.normalized_hash() => EntryStatus::Ok,
        Ok(actual) => EntryStatus::Mismatched {
            actual: Some(actual),
        },
        Err(err) => {
            warn!("integrity: unable to hash {}: {err}", path.display());
            EntryStatus::Mismatched { actual: None }
        }
    }
}

/// Compare every manifest entry against the files under `game_dir`.
pub fn inspect_blocking(manifest: &Manifest, game_dir: &Path) -> ValidationReport {
    build_report(manifest, game_dir, check_entry)
}

/// Report for when hashing could not run at all: every resolvable entry
/// counts as unreadable, so nothing passes as current.
fn unchecked_report(manifest: &Manifest, game_dir: &Path) -> ValidationReport {
    build_report(manifest, game_dir, |_, _| EntryStatus::Mismatched { actual: None })
}

fn build_report<F>(manifest: &Manifest, game_dir: &Path, check: F) -> ValidationReport
where
    F: Fn(&Path, &FileEntry) -> EntryStatus,
{
    let files = manifest
        .entries()
        .map(|(category, entry)| match manifest.resolve(category, entry, game_dir) {
            Ok(path) => {
                let status = check(&path, entry);
                debug!(
                    "integrity: {} {} -> {:?}",
                    category.label(),
                    path.display(),
                    status
                );
                LocalFile {
                    category,
                    entry: entry.clone(),
                    path,
                    status,
                }
            }
            Err(_) => {
                warn!("integrity: rejecting entry name {:?}", entry.name);
                LocalFile {
                    category,
                    entry: entry.clone(),
                    path: PathBuf::new(),
                    status: EntryStatus::InvalidName,
                }
            }
        })
        .collect();
    ValidationReport { files }
}

/// All-or-nothing check: stops at the first missing or mismatched file.
pub fn is_up_to_date_blocking(manifest: &Manifest, game_dir: &Path) -> bool {
    manifest.entries().all(|(category, entry)| {
        manifest
            .resolve(category, entry, game_dir)
            .map(|path| check_entry(&path, entry) == EntryStatus::Ok)
            .unwrap_or(false)
    })
}

pub async fn inspect(manifest: &Manifest, game_dir: &Path) -> ValidationReport {
    let owned = manifest.clone();
    let dir = game_dir.to_path_buf();
    let report = match tokio::task::spawn_blocking(move || inspect_blocking(&owned, &dir)).await {
        Ok(report) => report,
        Err(err) => {
            error!("integrity: hashing task failed ({err}); treating files as unverified");
            unchecked_report(manifest, game_dir)
        }
    };
    info!(
        "integrity: {} ok, {} missing, {} mismatched, {} rejected",
        report.ok().count(),
        report.missing().count(),
        report.mismatched().count(),
        report.rejected().count()
    );
    report
}

pub async fn is_up_to_date(manifest: &Manifest, game_dir: &Path) -> bool {
    let owned = manifest.clone();
    let dir = game_dir.to_path_buf();
    match tokio::task::spawn_blocking(move || is_up_to_date_blocking(&owned, &dir)).await {
        Ok(valid) => valid,
        Err(err) => {
            error!("integrity: hashing task failed ({err}); treating files as unverified");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    const WORLD_SHA256: &str = "486ea46224d1bb4fb680f34f7c9ad96a8f24ec88be73ea8e5a6c65260e9cb8a7";

    fn entry(name: &str, hash: &str) -> FileEntry {
        FileEntry {
            name: name.into(),
            url: format!("http://x/{name}"),
            hash: hash.into(),
        }
    }

    fn manifest() -> Manifest {
        Manifest {
            minecraft_version: "1.20.1".into(),
            mods_hash: "ignored".into(),
            client_files: vec![entry("a.jar", HELLO_SHA256)],
            mods: vec![entry("m.jar", WORLD_SHA256)],
        }
    }

    fn install(root: &Path) {
        let client = root.join("versions").join("1.20.1");
        fs::create_dir_all(&client).unwrap();
        fs::write(client.join("a.jar"), b"hello").unwrap();
        fs::create_dir_all(root.join("mods")).unwrap();
        fs::write(root.join("mods").join("m.jar"), b"world").unwrap();
    }

    #[test]
    fn hashes_file_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hello");
        fs::write(&path, b"hello").unwrap();
        assert_eq!(file_sha256(&path).unwrap(), HELLO_SHA256);
        assert!(file_sha256(&tmp.path().join("absent")).is_err());
    }

    #[test]
    fn hashes_files_larger_than_buffer() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("big");
        let data: Vec<u8> = (0..HASH_BUFFER * 3 + 17).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();
        assert_eq!(
            file_sha256(&path).unwrap(),
            format!("{:x}", Sha256::digest(&data))
        );
    }

    #[test]
    fn valid_install_passes() {
        let tmp = tempfile::tempdir().unwrap();
        install(tmp.path());
        assert!(is_up_to_date_blocking(&manifest(), tmp.path()));
        let report = inspect_blocking(&manifest(), tmp.path());
        assert!(report.is_valid());
        assert_eq!(report.ok().count(), 2);
    }

    #[test]
    fn manifest_hash_is_case_insensitive() {
        let tmp = tempfile::tempdir().unwrap();
        install(tmp.path());
        let mut m = manifest();
        m.client_files[0].hash = HELLO_SHA256.to_uppercase();
        assert!(is_up_to_date_blocking(&m, tmp.path()));
    }

    #[test]
    fn empty_manifest_is_vacuously_valid() {
        let tmp = tempfile::tempdir().unwrap();
        let m = Manifest {
            minecraft_version: "1.20.1".into(),
            mods_hash: String::new(),
            client_files: vec![],
            mods: vec![],
        };
        assert!(is_up_to_date_blocking(&m, tmp.path()));
        assert!(inspect_blocking(&m, tmp.path()).is_valid());
    }

    #[test]
    fn single_byte_change_fails_validation() {
        let tmp = tempfile::tempdir().unwrap();
        install(tmp.path());
        fs::write(tmp.path().join("mods").join("m.jar"), b"worle").unwrap();
        assert!(!is_up_to_date_blocking(&manifest(), tmp.path()));

        let report = inspect_blocking(&manifest(), tmp.path());
        let mismatched: Vec<_> = report.mismatched().map(|f| f.entry.name.as_str()).collect();
        assert_eq!(mismatched, vec!["m.jar"]);
        assert_eq!(report.ok().count(), 1);
    }

    #[test]
    fn deleted_file_fails_validation() {
        let tmp = tempfile::tempdir().unwrap();
        install(tmp.path());
        fs::remove_file(tmp.path().join("versions").join("1.20.1").join("a.jar")).unwrap();
        assert!(!is_up_to_date_blocking(&manifest(), tmp.path()));

        let report = inspect_blocking(&manifest(), tmp.path());
        let missing: Vec<_> = report.missing().map(|f| f.entry.name.as_str()).collect();
        assert_eq!(missing, vec!["a.jar"]);
        assert_eq!(report.stale().count(), 1);
    }

    #[test]
    fn directory_in_place_of_file_is_missing() {
        let tmp = tempfile::tempdir().unwrap();
        install(tmp.path());
        let path = tmp.path().join("mods").join("m.jar");
        fs::remove_file(&path).unwrap();
        fs::create_dir_all(&path).unwrap();
        let report = inspect_blocking(&manifest(), tmp.path());
        assert_eq!(report.missing().count(), 1);
    }

    #[test]
    fn rejected_names_are_reported_not_resolved() {
        let tmp = tempfile::tempdir().unwrap();
        install(tmp.path());
        let mut m = manifest();
        m.mods.push(entry("../outside.jar", HELLO_SHA256));
        assert!(!is_up_to_date_blocking(&m, tmp.path()));
        let report = inspect_blocking(&m, tmp.path());
        assert_eq!(report.rejected().count(), 1);
        assert_eq!(report.stale().count(), 0);
    }

    #[test]
    fn unhashed_files_never_count_as_current() {
        let tmp = tempfile::tempdir().unwrap();
        install(tmp.path());
        let mut m = manifest();
        m.mods.push(entry("../outside.jar", HELLO_SHA256));

        let report = unchecked_report(&m, tmp.path());
        assert!(!report.is_valid());
        assert_eq!(report.ok().count(), 0);
        assert_eq!(report.stale().count(), 2);
        assert!(report
            .mismatched()
            .all(|f| f.status == EntryStatus::Mismatched { actual: None }));
        assert_eq!(report.rejected().count(), 1);
    }

    #[test]
    fn empty_manifest_hash_never_matches() {
        let tmp = tempfile::tempdir().unwrap();
        install(tmp.path());
        let mut m = manifest();
        m.client_files[0].hash = String::new();
        assert!(!is_up_to_date_blocking(&m, tmp.path()));
    }

    #[tokio::test]
    async fn async_wrappers_match_blocking_results() {
        let tmp = tempfile::tempdir().unwrap();
        install(tmp.path());
        assert!(is_up_to_date(&manifest(), tmp.path()).await);
        assert!(inspect(&manifest(), tmp.path()).await.is_valid());
        let hash = file_sha256_async(&tmp.path().join("mods").join("m.jar"))
            .await
            .unwrap();
        assert_eq!(hash, WORLD_SHA256);
    }
}
