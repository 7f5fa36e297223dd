//! Authenticated request gateway
//!
//! The drive tree talks to iCloud exclusively through [`DriveGateway`]. Every
//! method is one request/response round-trip; retries and timeouts belong to
//! the implementation's transport.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ContentBody, DownloadTicket, ItemDetails, OperationResult};

/// Reserved identifier of the trash root.
pub const TRASH_ROOT_ID: &str = "TRASH_ROOT";

/// Identifier of the drive root in the default zone.
pub const ROOT_ID: &str = "FOLDER::com.apple.CloudDocs::root";

/// Remote operations backing the drive tree.
#[async_trait]
pub trait DriveGateway: Send + Sync {
    /// Fetch the descriptor of one item; folders include their immediate children.
    async fn node_details(&self, drivewsid: &str) -> Result<ItemDetails>;

    /// Fetch the trash root with its flat list of trashed items.
    async fn trash_details(&self) -> Result<ItemDetails> {
        self.node_details(TRASH_ROOT_ID).await
    }

    /// Put a trashed item back at its original location.
    async fn recover_from_trash(&self, drivewsid: &str, etag: &str) -> Result<OperationResult>;

    /// Permanently delete a trashed item.
    async fn delete_forever(&self, drivewsid: &str, etag: &str) -> Result<OperationResult>;

    /// Move an item into the trash.
    async fn move_to_trash(&self, drivewsid: &str, etag: &str) -> Result<OperationResult>;

    /// Create a folder named `name` under `parent`.
    async fn create_folder(&self, parent: &str, name: &str) -> Result<OperationResult>;

    /// Rename an item in place.
    async fn rename(&self, drivewsid: &str, etag: &str, name: &str) -> Result<OperationResult>;

    /// Resolve a short-lived signed URL for a document's bytes.
    ///
    /// `zone` falls back to the gateway's configured zone when `None`.
    async fn download_ticket(&self, docwsid: &str, zone: Option<&str>) -> Result<DownloadTicket>;

    /// Fetch the whole body behind a signed URL.
    async fn fetch_bytes(&self, ticket: &DownloadTicket) -> Result<ContentBody>;

    /// Open the body behind a signed URL for incremental reading.
    async fn fetch_stream(
        &self,
        ticket: &DownloadTicket,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>>;
}
