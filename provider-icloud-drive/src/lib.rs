//! # iCloud Drive Provider
//!
//! Lazy, remotely backed view of an iCloud Drive account.
//!
//! ## Overview
//!
//! This module provides:
//! - `DriveService`: entry point handing out the drive root and the trash
//! - `DriveNode`: one file or folder, resolved and listed on demand
//! - `TrashView` / `TrashItem`: flat trash listing with recover and delete-forever
//! - `ContentStream`: buffered or streamed file content
//! - `DriveGateway`: the remote operations the tree needs, implemented over
//!   the iCloud web API by `IcloudDriveConnector`

pub mod connector;
pub mod content;
pub mod error;
pub mod gateway;
pub mod node;
pub mod service;
pub mod trash;
pub mod types;

pub use connector::IcloudDriveConnector;
pub use content::ContentStream;
pub use error::{DriveError, Result};
pub use gateway::{DriveGateway, ROOT_ID, TRASH_ROOT_ID};
pub use node::{ChildListing, DriveNode, NodeKind, NodeMetadata, NodeState};
pub use service::DriveService;
pub use trash::{TrashItem, TrashView};
pub use types::{DownloadTicket, ItemDetails, OperationItem, OperationResult};
