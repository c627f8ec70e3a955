use std::fmt::Write;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::engine::state::AppState;
use crate::integrity::{EntryStatus, ValidationReport};

/// Renders engine updates on a single terminal progress bar.
pub struct ConsoleUi {
    bar: ProgressBar,
}

impl ConsoleUi {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("{spinner} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// Drain `updates` until every sender is gone.
    pub async fn run(self, mut updates: mpsc::UnboundedReceiver<AppState>) {
        while let Some(state) = updates.recv().await {
            self.apply(&state);
        }
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    fn apply(&self, state: &AppState) {
        if let Some(pct) = overall_percent(state) {
            self.bar.set_position(pct);
        }
        let text = status_text(state);
        match state {
            AppState::Playing | AppState::Error(_) => self.bar.finish_with_message(text),
            AppState::Idle => {}
            _ => self.bar.set_message(text),
        }
    }
}

/// Coarse position of the whole flow: check 10, validate 30, download 50–90, ready 100.
pub fn overall_percent(state: &AppState) -> Option<u64> {
    match state {
        AppState::CheckingForUpdates => Some(10),
        AppState::ValidatingFiles => Some(30),
        AppState::UpdateSkipped(_) | AppState::Error(_) => Some(0),
        AppState::Downloading {
            index,
            count,
            progress,
            ..
        } => {
            let count = (*count).max(1) as u64;
            let within = u64::from(progress.unwrap_or(0));
            Some(50 + (40 * (*index as u64 * 100 + within)) / (count * 100))
        }
        AppState::ReadyToPlay { .. } | AppState::Playing => Some(100),
        AppState::Idle | AppState::Launching => None,
    }
}

pub fn status_text(state: &AppState) -> String {
    match state {
        AppState::Idle => "Ready".into(),
        AppState::CheckingForUpdates => "Checking version...".into(),
        AppState::UpdateSkipped(reason) => {
            format!("Could not get version information ({reason})")
        }
        AppState::ValidatingFiles => "Checking local files...".into(),
        AppState::Downloading {
            file,
            index,
            count,
            progress,
        } => match progress {
            Some(pct) => format!("Downloading {file} ({}/{count}) {pct}%", index + 1),
            None => format!("Downloading {file} ({}/{count})...", index + 1),
        },
        AppState::ReadyToPlay { version } => format!("Ready to play {version}"),
        AppState::Launching => "Starting game...".into(),
        AppState::Playing => "Game started!".into(),
        AppState::Error(msg) => format!("Error: {msg}"),
    }
}

/// Plain-text listing of a validation report.
pub fn format_report(version: &str, report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Version {version}: {} files checked", report.files.len());
    for file in &report.files {
        let status = match &file.status {
            EntryStatus::Ok => "ok".to_string(),
            EntryStatus::Missing => "missing".to_string(),
            EntryStatus::Mismatched { actual: Some(actual) } => format!("mismatch ({actual})"),
            EntryStatus::Mismatched { actual: None } => "unreadable".to_string(),
            EntryStatus::InvalidName => "rejected name".to_string(),
        };
        let _ = writeln!(
            out,
            "  [{}] {:<6} {}",
            status,
            file.category.label(),
            file.entry.name
        );
    }
    let _ = writeln!(
        out,
        "{}",
        if report.is_valid() {
            "All files are up to date."
        } else {
            "Some files need to be downloaded."
        }
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::models::{FileCategory, FileEntry};
    use crate::integrity::LocalFile;
    use std::path::PathBuf;

    fn downloading(index: usize, count: usize, progress: Option<u8>) -> AppState {
        AppState::Downloading {
            file: "a.jar".into(),
            index,
            count,
            progress,
        }
    }

    #[test]
    fn overall_progress_follows_stages() {
        assert_eq!(overall_percent(&AppState::CheckingForUpdates), Some(10));
        assert_eq!(overall_percent(&AppState::ValidatingFiles), Some(30));
        assert_eq!(overall_percent(&downloading(0, 2, None)), Some(50));
        assert_eq!(overall_percent(&downloading(0, 2, Some(100))), Some(70));
        assert_eq!(overall_percent(&downloading(1, 2, Some(100))), Some(90));
        assert_eq!(
            overall_percent(&AppState::ReadyToPlay {
                version: "1".into()
            }),
            Some(100)
        );
        assert_eq!(overall_percent(&AppState::Launching), None);
    }

    #[test]
    fn download_status_handles_unknown_size() {
        assert_eq!(
            status_text(&downloading(0, 3, Some(42))),
            "Downloading a.jar (1/3) 42%"
        );
        assert_eq!(
            status_text(&downloading(2, 3, None)),
            "Downloading a.jar (3/3)..."
        );
    }

    #[test]
    fn report_lists_each_entry() {
        let entry = |name: &str| FileEntry {
            name: name.into(),
            url: String::new(),
            hash: String::new(),
        };
        let report = ValidationReport {
            files: vec![
                LocalFile {
                    category: FileCategory::Client,
                    entry: entry("a.jar"),
                    path: PathBuf::from("a.jar"),
                    status: EntryStatus::Ok,
                },
                LocalFile {
                    category: FileCategory::Mod,
                    entry: entry("m.jar"),
                    path: PathBuf::from("m.jar"),
                    status: EntryStatus::Missing,
                },
            ],
        };
        let text = format_report("1.20.1", &report);
        assert!(text.contains("2 files checked"));
        assert!(text.contains("[ok] client a.jar"));
        assert!(text.contains("[missing] mod    m.jar"));
        assert!(text.contains("Some files need to be downloaded."));
    }
}
