//! Launcher core: fetch a version manifest, verify local game files by
//! SHA-256, download whatever is missing or stale, and start the client.

pub mod engine;
pub mod env;
pub mod error;
pub mod integrity;
pub mod jre;
pub mod networking;
pub mod process;
pub mod storage;
pub mod sync;
pub mod ui;
pub mod util;
