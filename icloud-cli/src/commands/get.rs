//! Get command - download a file to the local filesystem.
//!
//! Without `-o` the file is saved under its drive name in the current
//! directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

use provider_icloud_drive::DriveService;

#[derive(ClapArgs)]
pub struct Args {
    /// File path within the drive
    pub path: String,

    /// Local destination
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[instrument(level = "info", name = "cmd::get", skip_all, fields(path = %args.path))]
pub async fn execute(drive: &DriveService, args: &Args) -> Result<()> {
    let node = drive
        .resolve_path(&args.path)
        .await
        .with_context(|| format!("Cannot resolve '{}'", args.path))?;

    let destination = match &args.output {
        Some(path) => path.clone(),
        None => PathBuf::from(node.name().await?),
    };

    let content = node.open(true).await?;
    let mut file = File::create(&destination)
        .await
        .with_context(|| format!("Cannot create {}", destination.display()))?;
    let written = content.copy_to(&mut file).await?;
    file.flush().await?;

    info!(bytes = written, destination = %destination.display(), "Download complete");
    println!("{} -> {} ({} bytes)", args.path, destination.display(), written);
    Ok(())
}
