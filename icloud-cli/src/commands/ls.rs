//! List command - list folder contents.
//!
//! ```bash
//! icloud ls
//! icloud ls -l pyiCloud/Test
//! ```

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use provider_icloud_drive::{DriveNode, DriveService};

use super::format_size;

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Folder path (default: drive root)
    #[arg(default_value = "/")]
    pub path: String,

    /// Show kind, size and modification date
    #[arg(short, long)]
    pub long: bool,
}

#[instrument(level = "info", name = "cmd::ls", skip_all, fields(path = %args.path))]
pub async fn execute(drive: &DriveService, args: &Args) -> Result<()> {
    let node = drive
        .resolve_path(&args.path)
        .await
        .with_context(|| format!("Cannot resolve '{}'", args.path))?;

    let Some(listing) = node
        .listing()
        .await
        .with_context(|| format!("Cannot list '{}'", args.path))?
    else {
        // ls on a file prints the file itself
        return print_entry(&node, &node.name().await?, args.long).await;
    };

    let names = listing.names();
    for (name, child) in names.iter().zip(listing.nodes()) {
        print_entry(&child, name, args.long).await?;
    }
    Ok(())
}

async fn print_entry(node: &DriveNode, name: &str, long: bool) -> Result<()> {
    if !long {
        println!("{name}");
        return Ok(());
    }

    let kind = node.kind().await?;
    let size = node.size().await?;
    let modified = node
        .date_modified()
        .await?
        .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string());

    println!(
        "{:<12} {:>12} {:<16} {}",
        kind.as_str(),
        format_size(size),
        modified,
        name
    );
    Ok(())
}
