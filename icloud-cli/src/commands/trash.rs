//! Trash command - list, recover and permanently delete trashed items.
//!
//! ```bash
//! icloud trash ls -l
//! icloud trash recover test_files_1
//! icloud trash purge test12345
//! ```

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Subcommand};
use tracing::instrument;

use provider_icloud_drive::DriveService;

use super::format_size;

#[derive(ClapArgs)]
pub struct Args {
    #[command(subcommand)]
    pub command: TrashCommand,
}

#[derive(Subcommand)]
pub enum TrashCommand {
    /// List trashed items
    Ls {
        /// Show kind, size and original location
        #[arg(short, long)]
        long: bool,
    },

    /// Put an item back where it was trashed from
    Recover {
        /// Name of the trashed item
        name: String,
    },

    /// Delete an item permanently
    Purge {
        /// Name of the trashed item
        name: String,
    },
}

#[instrument(level = "info", name = "cmd::trash", skip_all)]
pub async fn execute(drive: &DriveService, args: &Args) -> Result<()> {
    let trash = drive.trash();
    match &args.command {
        TrashCommand::Ls { long: false } => {
            for name in trash.list_children().await? {
                println!("{name}");
            }
        }
        TrashCommand::Ls { long: true } => {
            for item in trash.items().await? {
                let metadata = item.metadata().await?;
                println!(
                    "{:<12} {:>12} {:<24} {}",
                    metadata.kind().as_str(),
                    format_size(metadata.size()),
                    metadata.restore_path().unwrap_or("-"),
                    metadata.name()?
                );
            }
        }
        TrashCommand::Recover { name } => {
            trash
                .recover(name)
                .await
                .with_context(|| format!("Cannot recover '{name}'"))?;
        }
        TrashCommand::Purge { name } => {
            trash
                .delete_forever(name)
                .await
                .with_context(|| format!("Cannot delete '{name}'"))?;
        }
    }
    Ok(())
}
