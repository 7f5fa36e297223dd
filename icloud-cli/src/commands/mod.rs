//! Subcommand implementations

pub mod cat;
pub mod get;
pub mod ls;
pub mod mkdir;
pub mod mv;
pub mod rm;
pub mod trash;

use anyhow::{bail, Result};

/// Split a drive path into its parent folder path and final name.
///
/// Leading, trailing and repeated separators are ignored.
pub(crate) fn split_parent(path: &str) -> Result<(String, String)> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some(name) = segments.pop() else {
        bail!("'{path}' does not name an item below the drive root");
    };
    Ok((segments.join("/"), name.to_string()))
}

pub(crate) fn format_size(size: Option<u64>) -> String {
    size.map_or_else(|| "-".to_string(), |s| s.to_string())
}
