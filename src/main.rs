use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod auth;
mod commands;
mod constants;
mod converter;
mod drive;
mod error;
mod folder_ref;
mod image_processing;
mod lister;
mod placement;
mod processing;
mod prompts;
mod settings;
mod sheets;
mod storage;
mod utils;

#[cfg(test)]
mod testing;

use auth::AccessToken;
use commands::Command;
use drive::DriveClient;
use error::{AppError, AppResult};
use processing::Workflow;
use prompts::{ConsolePrompter, Prompter};
use settings::Settings;
use sheets::SheetsClient;

/// Convert HEIC photos in a Google Drive folder to JPEG and show them in a Google Sheet
#[derive(Debug, Parser)]
#[command(name = "heicsheet", version, about)]
struct Cli {
    /// Configuration file (defaults to heicsheet.ini in the app data directory)
    #[arg(long, global = true, env = "HEICSHEET_CONFIG")]
    config: Option<PathBuf>,

    /// Target spreadsheet ID
    #[arg(long, global = true)]
    spreadsheet: Option<String>,

    /// Numeric ID of the sheet tab (the `gid` in its URL)
    #[arg(long, global = true)]
    sheet_id: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("heicsheet=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn init_config(path: &Path, force: bool) -> Result<String> {
    if path.exists() && !force {
        return Ok(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    Settings::default().save_to(path)?;
    Ok(format!("Wrote default settings to {}", path.display()))
}

async fn run_with_backends(
    command: &Command,
    settings: &Settings,
    config_path: &Path,
    prompter: &dyn Prompter,
) -> AppResult<String> {
    let spreadsheet_id = settings.spreadsheet_id.clone().ok_or_else(|| {
        AppError::Config(format!(
            "no spreadsheet configured; pass --spreadsheet or set spreadsheet_id in {}",
            config_path.display()
        ))
    })?;
    let token = AccessToken::resolve(settings)?;
    let drive = DriveClient::from_settings(settings, token.clone())?;
    let sheet = SheetsClient::new(
        &settings.sheets_api_base,
        &spreadsheet_id,
        settings.sheet_id,
        token,
        settings.request_timeout(),
    )?;

    info!("🚀 HeicSheet v{} starting", env!("CARGO_PKG_VERSION"));
    let workflow = Workflow::new(&drive, &sheet, settings);
    commands::run(command, &workflow, prompter).await
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Settings::config_path);
    let prompter = ConsolePrompter;

    if let Command::InitConfig { force } = cli.command {
        let message = init_config(&config_path, force)?;
        prompter.alert("Configuration", &message);
        return Ok(());
    }

    let mut settings = Settings::load_from(&config_path)
        .with_context(|| format!("Failed to load settings from {}", config_path.display()))?;
    if let Some(id) = cli.spreadsheet {
        settings.spreadsheet_id = Some(id);
    }
    if let Some(sheet_id) = cli.sheet_id {
        settings.sheet_id = sheet_id;
    }
    debug!("Settings: {:?}", settings);

    let result = run_with_backends(&cli.command, &settings, &config_path, &prompter).await;

    let code = commands::report(&prompter, result);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
