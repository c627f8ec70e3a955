// The central source of truth for the front-end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppState {
    Idle,
    CheckingForUpdates,
    /// The manifest could not be fetched; local files were left as they are.
    UpdateSkipped(String),
    ValidatingFiles,
    Downloading {
        file: String,
        index: usize,
        count: usize,
        /// `None` while the server has not announced a size.
        progress: Option<u8>,
    },
    ReadyToPlay {
        version: String,
    },
    Launching,
    Playing,
    Error(String),
}

// Actions triggered by the user from the front-end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserAction {
    ClickPlay,
    CheckForUpdates,
}
