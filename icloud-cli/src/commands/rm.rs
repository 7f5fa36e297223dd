use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use provider_icloud_drive::DriveService;

use super::split_parent;

#[derive(ClapArgs)]
pub struct Args {
    /// Item to move to the trash
    pub path: String,
}

#[instrument(level = "info", name = "cmd::rm", skip_all, fields(path = %args.path))]
pub async fn execute(drive: &DriveService, args: &Args) -> Result<()> {
    let (parent, name) = split_parent(&args.path)?;
    let folder = drive
        .resolve_path(&parent)
        .await
        .with_context(|| format!("Cannot resolve '{parent}'"))?;
    folder.trash_child(&name).await?;
    Ok(())
}
