use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info, warn};

use crate::engine::models::GameProfile;
use crate::env;
use crate::error::LaunchError;
use crate::jre::JavaLocator;

const MAIN_CLASS: &str = "net.minecraft.client.main.Main";
const OFFLINE_UUID: &str = "00000000-0000-0000-0000-000000000000";

#[derive(Clone, Default)]
pub struct ProcessLauncher {
    locator: JavaLocator,
}

impl ProcessLauncher {
    pub fn new(locator: JavaLocator) -> Self {
        Self { locator }
    }

    /// Client jar for `version` under `game_dir`.
    pub fn client_jar(game_dir: &Path, version: &str) -> PathBuf {
        env::version_dir(game_dir, version).join(format!("minecraft-{version}.jar"))
    }

    /// Start the game client and return without waiting for it.
    pub fn launch(&self, profile: &GameProfile, game_dir: &Path) -> Result<(), LaunchError> {
        let java = self
            .locator
            .clone()
            .prefer(&profile.java_path)
            .find()
            .ok_or(LaunchError::JavaNotFound)?;

        let jar = Self::client_jar(game_dir, &profile.minecraft_version);
        if !jar.is_file() {
            warn!("launch: client not found at {}", jar.display());
            return Err(LaunchError::ClientMissing(jar));
        }

        let args = build_arguments(profile, game_dir, &jar);
        info!(
            "launch: starting version {} for player {}",
            profile.minecraft_version, profile.player_name
        );
        debug!(
            "launch: java={} game_dir={} args={:?}",
            java.display(),
            game_dir.display(),
            args
        );

        let mut cmd = Command::new(&java);
        cmd.args(&args)
            .current_dir(game_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().map_err(LaunchError::Spawn)?;
        info!("launch: process {} started", child.id());
        Ok(())
    }
}

/// JVM flags, classpath and the offline identity arguments, one OS string
/// per argument.
pub fn build_arguments(profile: &GameProfile, game_dir: &Path, jar: &Path) -> Vec<OsString> {
    let version = profile.minecraft_version.as_str();
    let natives = env::version_dir(game_dir, version).join("natives");

    let mut library_path = OsString::from("-Djava.library.path=");
    library_path.push(natives.as_os_str());

    vec![
        format!("-Xmx{}", profile.max_memory).into(),
        format!("-Xms{}", profile.min_memory).into(),
        library_path,
        "-cp".into(),
        jar.into(),
        MAIN_CLASS.into(),
        "--gameDir".into(),
        game_dir.into(),
        "--assetsDir".into(),
        env::assets_dir(game_dir).into(),
        "--version".into(),
        version.into(),
        "--username".into(),
        profile.player_name.as_str().into(),
        "--uuid".into(),
        OFFLINE_UUID.into(),
        "--accessToken".into(),
        "null".into(),
        "--userType".into(),
        "offline".into(),
    ]
}
