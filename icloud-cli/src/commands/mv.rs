use anyhow::{bail, Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use provider_icloud_drive::DriveService;

use super::split_parent;

// Renames in place; the item stays in its folder.
#[derive(ClapArgs)]
pub struct Args {
    /// Item to rename
    pub path: String,

    /// New name, without a folder component
    pub new_name: String,
}

#[instrument(level = "info", name = "cmd::mv", skip_all, fields(path = %args.path, new_name = %args.new_name))]
pub async fn execute(drive: &DriveService, args: &Args) -> Result<()> {
    if args.new_name.contains('/') {
        bail!("new name '{}' must not contain '/'", args.new_name);
    }
    let (parent, name) = split_parent(&args.path)?;
    let folder = drive
        .resolve_path(&parent)
        .await
        .with_context(|| format!("Cannot resolve '{parent}'"))?;
    folder.rename_child(&name, &args.new_name).await?;
    Ok(())
}
