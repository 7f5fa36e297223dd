use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

use provider_icloud_drive::DriveService;

#[derive(ClapArgs)]
pub struct Args {
    /// File path within the drive
    pub path: String,
}

#[instrument(level = "info", name = "cmd::cat", skip_all, fields(path = %args.path))]
pub async fn execute(drive: &DriveService, args: &Args) -> Result<()> {
    let node = drive
        .resolve_path(&args.path)
        .await
        .with_context(|| format!("Cannot resolve '{}'", args.path))?;
    let content = node.open(true).await?;

    let mut stdout = tokio::io::stdout();
    content.copy_to(&mut stdout).await?;
    stdout.flush().await?;
    Ok(())
}
