//! Trash view
//!
//! The trash is a flat pseudo-folder: every trashed item is a direct child
//! regardless of where it used to live. Recovering or permanently deleting
//! an item removes it from the cached trash listing; listings of the item's
//! former or new parent folder are not touched.

use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::Result;
use crate::gateway::{DriveGateway, TRASH_ROOT_ID};
use crate::node::{ensure_accepted, DriveNode, NodeKind, NodeMetadata};
use crate::types::OperationResult;

/// Root of the trash.
#[derive(Debug, Clone)]
pub struct TrashView {
    root: Arc<DriveNode>,
}

impl TrashView {
    pub fn new(gateway: Arc<dyn DriveGateway>) -> Self {
        Self {
            root: Arc::new(DriveNode::trash_root(gateway)),
        }
    }

    pub fn name(&self) -> &'static str {
        TRASH_ROOT_ID
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Trash
    }

    /// Underlying node, for generic tree code.
    pub fn node(&self) -> &Arc<DriveNode> {
        &self.root
    }

    /// Names of trashed items in response order.
    pub async fn list_children(&self) -> Result<Vec<String>> {
        Ok(self.root.list_children().await?.unwrap_or_default())
    }

    pub async fn items(&self) -> Result<Vec<TrashItem>> {
        Ok(self
            .root
            .children()
            .await?
            .into_iter()
            .map(|node| self.item(node))
            .collect())
    }

    pub async fn get_child(&self, name: &str) -> Result<TrashItem> {
        let node = self.root.get_child(name).await?;
        Ok(self.item(node))
    }

    pub async fn recover(&self, name: &str) -> Result<OperationResult> {
        self.get_child(name).await?.recover().await
    }

    pub async fn delete_forever(&self, name: &str) -> Result<OperationResult> {
        self.get_child(name).await?.delete_forever().await
    }

    /// Drop the cached trash listing.
    pub fn refresh(&self) {
        self.root.invalidate();
    }

    fn item(&self, node: Arc<DriveNode>) -> TrashItem {
        TrashItem {
            trash: Arc::clone(&self.root),
            node,
        }
    }
}

/// One trashed item.
#[derive(Debug, Clone)]
pub struct TrashItem {
    trash: Arc<DriveNode>,
    node: Arc<DriveNode>,
}

impl TrashItem {
    pub fn node(&self) -> &Arc<DriveNode> {
        &self.node
    }

    pub fn drivewsid(&self) -> &str {
        self.node.drivewsid()
    }

    pub async fn metadata(&self) -> Result<Arc<NodeMetadata>> {
        self.node.resolve().await
    }

    pub async fn name(&self) -> Result<String> {
        self.node.name().await
    }

    /// Where the item will be put back, when iCloud reports it.
    pub async fn restore_path(&self) -> Result<Option<String>> {
        Ok(self.metadata().await?.restore_path().map(str::to_string))
    }

    /// Put the item back at its original location.
    #[instrument(skip(self), fields(drivewsid = %self.node.drivewsid()))]
    pub async fn recover(&self) -> Result<OperationResult> {
        let (name, etag) = self.identity().await?;
        let result = self
            .gateway()
            .recover_from_trash(self.drivewsid(), &etag)
            .await?;
        let result = ensure_accepted(result, &name)?;

        info!(name = %name, "Recovered from trash");
        self.forget();
        Ok(result)
    }

    /// Permanently delete the item.
    #[instrument(skip(self), fields(drivewsid = %self.node.drivewsid()))]
    pub async fn delete_forever(&self) -> Result<OperationResult> {
        let (name, etag) = self.identity().await?;
        let result = self
            .gateway()
            .delete_forever(self.drivewsid(), &etag)
            .await?;
        let result = ensure_accepted(result, &name)?;

        info!(name = %name, "Deleted forever");
        self.forget();
        Ok(result)
    }

    async fn identity(&self) -> Result<(String, String)> {
        let metadata = self.metadata().await?;
        let etag = metadata.require_etag()?.to_string();
        Ok((metadata.name()?, etag))
    }

    fn gateway(&self) -> &Arc<dyn DriveGateway> {
        self.trash.gateway()
    }

    /// Remove this item from the cached trash listing, if one is loaded.
    fn forget(&self) {
        self.trash.prune_child(self.drivewsid());
    }
}
