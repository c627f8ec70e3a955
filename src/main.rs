use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::error;
use tokio::sync::mpsc;

use craft_launcher::engine::state::{AppState, UserAction};
use craft_launcher::engine::{LauncherEngine, Overrides, VerifyResult};
use craft_launcher::error::LaunchError;
use craft_launcher::storage::StorageManager;
use craft_launcher::{env, jre, ui};

#[derive(Parser, Debug)]
#[command(
    name = "craft-launcher",
    author,
    version,
    about = "Game launcher that keeps client files and mods in sync with a server manifest"
)]
struct Cli {
    /// Game directory to use instead of the configured one.
    #[arg(long, global = true)]
    game_dir: Option<PathBuf>,

    /// Server base URL to use instead of the configured one.
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Update files, then start the game (default).
    Play,
    /// Fetch the manifest and download missing or outdated files.
    Sync,
    /// Compare local files with the manifest without downloading.
    Verify {
        /// Stop at the first bad file and only print whether the install is current.
        #[arg(long)]
        quick: bool,
    },
    /// Show which Java runtime would be used.
    Java,
    /// Print the launcher's directories and config files.
    Paths,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let storage = match &cli.game_dir {
        Some(dir) => StorageManager::new(dir.clone()),
        None => StorageManager::at_default_location(),
    };
    if let Err(err) = storage.ensure_layout() {
        error!("startup: {err}");
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    let overrides = Overrides {
        game_dir: cli.game_dir.clone(),
        server_url: cli.server.clone(),
    };

    match cli.command.unwrap_or(Command::Play) {
        Command::Play => run_action(storage, overrides, UserAction::ClickPlay).await,
        Command::Sync => run_action(storage, overrides, UserAction::CheckForUpdates).await,
        Command::Verify { quick } => verify(storage, overrides, quick).await,
        Command::Java => show_java(&storage).await,
        Command::Paths => show_paths(storage, overrides).await,
    }
}

/// Run one engine action while the console consumes its progress updates.
async fn run_action(storage: StorageManager, overrides: Overrides, action: UserAction) -> ExitCode {
    let mut engine = LauncherEngine::from_config(storage, overrides).await;
    let (tx, rx) = mpsc::unbounded_channel();
    let presenter = tokio::spawn(ui::ConsoleUi::new().run(rx));

    engine.handle_action(action, &tx).await;
    drop(tx);
    let _ = presenter.await;

    match &engine.state {
        state @ AppState::Error(_) => {
            eprintln!("{}", ui::status_text(state));
            ExitCode::FAILURE
        }
        state => {
            println!("{}", ui::status_text(state));
            ExitCode::SUCCESS
        }
    }
}

async fn verify(storage: StorageManager, overrides: Overrides, quick: bool) -> ExitCode {
    let mut engine = LauncherEngine::from_config(storage, overrides).await;
    match engine.verify_files(quick).await {
        Ok(result) => {
            match &result {
                VerifyResult::Quick { version, valid } => {
                    let verdict = if *valid { "up to date" } else { "needs update" };
                    println!("Version {version}: {verdict}");
                }
                VerifyResult::Detailed { version, report } => {
                    print!("{}", ui::format_report(version, report));
                }
            }
            if result.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(err) => {
            error!("verify: {err}");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn show_java(storage: &StorageManager) -> ExitCode {
    let profile = storage.load_profile().await;
    let locator = jre::JavaLocator::from_env().prefer(&profile.java_path);
    match locator.find() {
        Some(java) => {
            println!("Java: {}", java.display());
            if let Some(version) = jre::java_version(&java) {
                println!("Version: {version}");
            }
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("{}", LaunchError::JavaNotFound);
            ExitCode::FAILURE
        }
    }
}

async fn show_paths(storage: StorageManager, overrides: Overrides) -> ExitCode {
    let engine = LauncherEngine::from_config(storage, overrides.clone()).await;
    let mut config = engine.storage().load_config().await;
    if let Some(url) = overrides.server_url {
        config.server_url = url;
    }
    let game_dir = engine.resolved_game_dir(&config);
    println!("Launcher root:  {}", engine.storage().base_dir().display());
    println!("Config file:    {}", engine.storage().config_path().display());
    println!("Profile file:   {}", engine.storage().profiles_path().display());
    println!("Game directory: {}", game_dir.display());
    println!("Mods directory: {}", env::mods_dir(&game_dir).display());
    println!("Logs directory: {}", env::logs_dir(&game_dir).display());
    println!("Manifest URL:   {}", config.manifest_endpoint());
    if let Some(checked) = config.last_update_check {
        println!("Last check:     {}", checked.to_rfc3339());
    }
    ExitCode::SUCCESS
}
