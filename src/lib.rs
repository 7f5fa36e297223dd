//! Workspace facade crate.
//!
//! Re-exports the iCloud Drive provider and runtime setup behind the
//! `desktop-shims` feature so a host application can depend on
//! `icloud-workspace` alone and get the reqwest-backed transport wired in.

#[cfg(feature = "desktop-shims")]
pub use core_runtime::{config::CoreConfig, logging};
#[cfg(feature = "desktop-shims")]
pub use provider_icloud_drive::*;
