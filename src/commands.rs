use clap::Subcommand;
use tracing::error;

use crate::error::{AppError, AppResult};
use crate::processing::{Candidates, Workflow};
use crate::prompts::Prompter;

/// Commands exposed to the shell. Missing inputs are asked for interactively.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Convert one HEIC file from the folder and show it in the target cell
    ConvertOne {
        /// Drive folder link or ID
        #[arg(long)]
        folder: Option<String>,
        /// 1-based number of the file, as printed by `list`
        #[arg(long)]
        index: Option<usize>,
    },
    /// Convert every HEIC file in the folder, lay them out on a grid and trash the originals
    ConvertAll {
        #[arg(long)]
        folder: Option<String>,
        /// Skip the confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Print the HEIC files of a folder
    List {
        #[arg(long)]
        folder: Option<String>,
    },
    /// Write a configuration file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn folder_input(prompter: &dyn Prompter, folder: &Option<String>) -> AppResult<String> {
    match folder {
        Some(f) => Ok(f.clone()),
        None => prompter
            .prompt("Select folder", "Paste the Google Drive folder link or ID:")
            .ok_or(AppError::Cancelled),
    }
}

pub fn numbered_list(candidates: &Candidates) -> String {
    candidates
        .files
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{}. {}", i + 1, f.name))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_index(raw: &str, count: usize) -> AppResult<usize> {
    raw.trim().parse::<usize>().map_err(|_| {
        AppError::NotFound(format!(
            "Invalid selection {:?}: choose a number between 1 and {}.",
            raw.trim(),
            count
        ))
    })
}

/// Runs one command and returns the message for the final dialog
pub async fn run(
    command: &Command,
    workflow: &Workflow<'_>,
    prompter: &dyn Prompter,
) -> AppResult<String> {
    match command {
        Command::List { folder } => {
            let input = folder_input(prompter, folder)?;
            let candidates = workflow.candidates(&input).await?;
            Ok(format!(
                "{} HEIC files:\n{}",
                candidates.files.len(),
                numbered_list(&candidates)
            ))
        }
        Command::ConvertOne { folder, index } => {
            let input = folder_input(prompter, folder)?;
            let outcome = match index {
                Some(i) => workflow.convert_single(&input, *i).await?,
                None => {
                    let candidates = workflow.candidates(&input).await?;
                    prompter.alert("HEIC files", &numbered_list(&candidates));
                    let raw = prompter
                        .prompt(
                            "Select file",
                            &format!("Enter the file number (1-{}):", candidates.files.len()),
                        )
                        .ok_or(AppError::Cancelled)?;
                    let index = parse_index(&raw, candidates.files.len())?;
                    workflow.convert_selected(&candidates, index).await?
                }
            };
            Ok(format!(
                "Converted {} → {} and placed it at {}.",
                outcome.original_name, outcome.new_name, outcome.cell
            ))
        }
        Command::ConvertAll { folder, yes } => {
            let input = folder_input(prompter, folder)?;
            let summary = workflow
                .convert_all(&input, |files| {
                    *yes
                        || prompter.confirm(
                            "Convert all",
                            &format!(
                                "Convert {} HEIC files to JPEG? Originals are moved to trash after conversion.",
                                files.len()
                            ),
                        )
                })
                .await?;
            Ok(summary.message())
        }
        Command::InitConfig { .. } => Err(AppError::Config(
            "init-config does not run against the backends".to_string(),
        )),
    }
}

/// Shows the outcome as a dialog and returns the process exit code
pub fn report(prompter: &dyn Prompter, result: AppResult<String>) -> i32 {
    match result {
        Ok(message) => {
            prompter.alert("Done", &message);
            0
        }
        Err(AppError::Cancelled) => {
            prompter.alert("Cancelled", "Nothing was changed.");
            0
        }
        Err(e) => {
            error!("❌ {}", e);
            prompter.alert(e.title(), &e.to_string());
            1
        }
    }
}
