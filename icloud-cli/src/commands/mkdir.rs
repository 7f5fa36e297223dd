use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use provider_icloud_drive::DriveService;

use super::split_parent;

#[derive(ClapArgs)]
pub struct Args {
    /// Path of the folder to create
    pub path: String,
}

#[instrument(level = "info", name = "cmd::mkdir", skip_all, fields(path = %args.path))]
pub async fn execute(drive: &DriveService, args: &Args) -> Result<()> {
    let (parent, name) = split_parent(&args.path)?;
    let folder = drive
        .resolve_path(&parent)
        .await
        .with_context(|| format!("Cannot resolve '{parent}'"))?;
    folder.create_folder(&name).await?;
    Ok(())
}
