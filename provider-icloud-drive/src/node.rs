//! Drive nodes
//!
//! A [`DriveNode`] is one entry of the iCloud Drive tree. It starts either
//! `Unresolved` (only its identifier is known) or `Resolved` (metadata taken
//! from the parent's listing) and moves to `Resolved` through [`DriveNode::resolve`].
//! Folder children are fetched on first use and cached on the node until
//! [`DriveNode::invalidate`] is called.
//!
//! Locks guard only in-memory state and are never held across a remote call,
//! so two tasks racing on first access may both fetch; the cached state
//! converges to the last response written.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::content::ContentStream;
use crate::error::{DriveError, Result};
use crate::gateway::{DriveGateway, TRASH_ROOT_ID};
use crate::types::{ItemDetails, OperationResult};

/// Kind of a drive entry, parsed from the raw `type` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Folder,
    File,
    AppLibrary,
    FolderAlias,
    Trash,
    Unknown,
}

impl NodeKind {
    /// Unrecognized strings map to `Unknown`.
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "folder" => Self::Folder,
            "file" => Self::File,
            "app_library" => Self::AppLibrary,
            "folder_alias" => Self::FolderAlias,
            "trash" => Self::Trash,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::File => "file",
            Self::AppLibrary => "app_library",
            Self::FolderAlias => "folder_alias",
            Self::Trash => "trash",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached descriptor of a resolved node.
///
/// Child descriptors are not retained here; they live in the node's listing.
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    details: ItemDetails,
}

impl NodeMetadata {
    pub fn new(mut details: ItemDetails) -> Self {
        details.items = None;
        Self { details }
    }

    pub fn drivewsid(&self) -> &str {
        &self.details.drivewsid
    }

    /// Display name, including the extension when there is one.
    ///
    /// The drive root and the trash root carry no name and get fixed ones.
    pub fn name(&self) -> Result<String> {
        match (&self.details.name, &self.details.extension) {
            (Some(name), Some(extension)) if !extension.is_empty() => {
                Ok(format!("{}.{}", name, extension))
            }
            (Some(name), _) => Ok(name.clone()),
            (None, _) => derived_name(&self.details.drivewsid).ok_or_else(|| {
                DriveError::NameUnavailable {
                    drivewsid: self.details.drivewsid.clone(),
                }
            }),
        }
    }

    /// The trash root is always `Trash`, whatever type the service reports.
    pub fn kind(&self) -> NodeKind {
        if self.details.drivewsid == TRASH_ROOT_ID {
            return NodeKind::Trash;
        }
        self.details
            .item_type
            .as_deref()
            .map(NodeKind::from_raw)
            .unwrap_or(NodeKind::Unknown)
    }

    pub fn size(&self) -> Option<u64> {
        self.details.size
    }

    pub fn date_created(&self) -> Option<DateTime<Utc>> {
        parse_date(self.details.date_created.as_deref())
    }

    pub fn date_changed(&self) -> Option<DateTime<Utc>> {
        parse_date(self.details.date_changed.as_deref())
    }

    pub fn date_modified(&self) -> Option<DateTime<Utc>> {
        parse_date(self.details.date_modified.as_deref())
    }

    pub fn date_last_open(&self) -> Option<DateTime<Utc>> {
        parse_date(self.details.last_open_time.as_deref())
    }

    pub fn etag(&self) -> Option<&str> {
        self.details.etag.as_deref()
    }

    pub fn docwsid(&self) -> Option<&str> {
        self.details.docwsid.as_deref()
    }

    pub fn zone(&self) -> Option<&str> {
        self.details.zone.as_deref()
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.details.parent_id.as_deref()
    }

    /// Original location of a trashed item.
    pub fn restore_path(&self) -> Option<&str> {
        self.details.restore_path.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.details.status.as_deref()
    }

    pub fn raw(&self) -> &ItemDetails {
        &self.details
    }

    pub(crate) fn require_etag(&self) -> Result<&str> {
        self.etag().ok_or_else(|| DriveError::MissingField {
            drivewsid: self.details.drivewsid.clone(),
            field: "etag",
        })
    }
}

fn derived_name(drivewsid: &str) -> Option<String> {
    if drivewsid == TRASH_ROOT_ID {
        return Some(TRASH_ROOT_ID.to_string());
    }
    match drivewsid.rsplit("::").next() {
        Some("root") if drivewsid.starts_with("FOLDER::") => Some("root".to_string()),
        _ => None,
    }
}

fn parse_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(date) => Some(date.with_timezone(&Utc)),
        Err(e) => {
            debug!(value = raw, error = %e, "Ignoring unparseable date");
            None
        }
    }
}

/// Resolution state of a node.
#[derive(Debug, Clone)]
pub enum NodeState {
    /// Only the identifier is known.
    Unresolved,
    /// Metadata has been fetched or supplied by the parent listing.
    Resolved(Arc<NodeMetadata>),
}

/// Immediate children of a folder, in response order.
///
/// Names are indexed for lookup; when a listing contains the same name more
/// than once the later entry wins the lookup while both stay enumerable.
pub struct ChildListing {
    entries: Vec<(String, Arc<DriveNode>)>,
    index: HashMap<String, usize>,
}

impl ChildListing {
    fn from_items(gateway: &Arc<dyn DriveGateway>, items: Vec<ItemDetails>) -> Result<Self> {
        let mut entries = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());

        for item in items {
            let metadata = NodeMetadata::new(item);
            let name = metadata.name()?;
            let child = Arc::new(DriveNode::with_metadata(Arc::clone(gateway), metadata));
            index.insert(name.clone(), entries.len());
            entries.push((name, child));
        }

        Ok(Self { entries, index })
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn nodes(&self) -> Vec<Arc<DriveNode>> {
        self.entries.iter().map(|(_, node)| Arc::clone(node)).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<DriveNode>> {
        self.index
            .get(name)
            .map(|&position| Arc::clone(&self.entries[position].1))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of this listing without the entries for `drivewsid`.
    fn without(&self, drivewsid: &str) -> Self {
        let mut entries = Vec::with_capacity(self.entries.len());
        let mut index = HashMap::with_capacity(self.entries.len());

        for (name, node) in &self.entries {
            if node.drivewsid() == drivewsid {
                continue;
            }
            index.insert(name.clone(), entries.len());
            entries.push((name.clone(), Arc::clone(node)));
        }

        Self { entries, index }
    }
}

impl fmt::Debug for ChildListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(name, _)| name))
            .finish()
    }
}

/// How a node's details are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailsSource {
    Drive,
    Trash,
}

/// One entry of the drive tree.
pub struct DriveNode {
    gateway: Arc<dyn DriveGateway>,
    drivewsid: String,
    source: DetailsSource,
    state: RwLock<NodeState>,
    children: RwLock<Option<Arc<ChildListing>>>,
}

impl DriveNode {
    /// Unresolved node for a known identifier.
    pub fn new(gateway: Arc<dyn DriveGateway>, drivewsid: impl Into<String>) -> Self {
        Self {
            gateway,
            drivewsid: drivewsid.into(),
            source: DetailsSource::Drive,
            state: RwLock::new(NodeState::Unresolved),
            children: RwLock::new(None),
        }
    }

    /// Unresolved trash root; its details come from the trash listing endpoint.
    pub(crate) fn trash_root(gateway: Arc<dyn DriveGateway>) -> Self {
        Self {
            source: DetailsSource::Trash,
            ..Self::new(gateway, TRASH_ROOT_ID)
        }
    }

    /// Resolved node built from a descriptor already in hand.
    pub fn with_metadata(gateway: Arc<dyn DriveGateway>, metadata: NodeMetadata) -> Self {
        Self {
            gateway,
            drivewsid: metadata.drivewsid().to_string(),
            source: DetailsSource::Drive,
            state: RwLock::new(NodeState::Resolved(Arc::new(metadata))),
            children: RwLock::new(None),
        }
    }

    pub fn drivewsid(&self) -> &str {
        &self.drivewsid
    }

    pub(crate) fn gateway(&self) -> &Arc<dyn DriveGateway> {
        &self.gateway
    }

    pub fn state(&self) -> NodeState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Cached metadata, without fetching.
    pub fn metadata(&self) -> Option<Arc<NodeMetadata>> {
        match &*self.state.read().unwrap_or_else(|e| e.into_inner()) {
            NodeState::Resolved(metadata) => Some(Arc::clone(metadata)),
            NodeState::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.metadata().is_some()
    }

    fn cached_listing(&self) -> Option<Arc<ChildListing>> {
        self.children
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn store_listing(&self, listing: Option<Arc<ChildListing>>) {
        *self.children.write().unwrap_or_else(|e| e.into_inner()) = listing;
    }

    /// Drop the child with `drivewsid` from the cached listing, if one is loaded.
    pub(crate) fn prune_child(&self, drivewsid: &str) {
        let mut children = self.children.write().unwrap_or_else(|e| e.into_inner());
        if let Some(listing) = children.take() {
            *children = Some(Arc::new(listing.without(drivewsid)));
        }
    }

    async fn fetch_details(&self) -> Result<ItemDetails> {
        match self.source {
            DetailsSource::Drive => self.gateway.node_details(&self.drivewsid).await,
            DetailsSource::Trash => self.gateway.trash_details().await,
        }
    }

    /// Record freshly fetched details; caches the listing when it came along.
    fn absorb(&self, mut details: ItemDetails) -> Result<(Arc<NodeMetadata>, Option<Arc<ChildListing>>)> {
        let items = details.items.take();
        let metadata = Arc::new(NodeMetadata::new(details));

        let listing = match items {
            Some(items) if !metadata.kind().is_file() => {
                Some(Arc::new(ChildListing::from_items(&self.gateway, items)?))
            }
            _ => None,
        };

        *self.state.write().unwrap_or_else(|e| e.into_inner()) =
            NodeState::Resolved(Arc::clone(&metadata));
        if listing.is_some() {
            self.store_listing(listing.clone());
        }

        Ok((metadata, listing))
    }

    /// Move to `Resolved`, fetching details at most once.
    ///
    /// Calling this on a resolved node returns the cached metadata.
    #[instrument(skip(self), fields(drivewsid = %self.drivewsid))]
    pub async fn resolve(&self) -> Result<Arc<NodeMetadata>> {
        if let Some(metadata) = self.metadata() {
            return Ok(metadata);
        }

        debug!("Resolving node");
        let details = self.fetch_details().await?;
        let (metadata, _) = self.absorb(details)?;
        Ok(metadata)
    }

    /// Children of this node, fetched on first use.
    ///
    /// Returns `Ok(None)` for files, which structurally have no children.
    pub async fn listing(&self) -> Result<Option<Arc<ChildListing>>> {
        if let Some(listing) = self.cached_listing() {
            return Ok(Some(listing));
        }
        if self.metadata().is_some_and(|metadata| metadata.kind().is_file()) {
            return Ok(None);
        }

        debug!(drivewsid = %self.drivewsid, "Fetching folder listing");
        let details = self.fetch_details().await?;

        if details.items.is_none() {
            let kind = details.item_type.as_deref().map(NodeKind::from_raw);
            if kind == Some(NodeKind::File) {
                self.absorb(details)?;
                return Ok(None);
            }

            // A bare status reply keeps whatever metadata the node already has.
            let status = details.status.unwrap_or_else(|| "UNKNOWN".to_string());
            warn!(drivewsid = %self.drivewsid, status = %status, "Folder listing unavailable");
            return Err(DriveError::ListingUnavailable { status });
        }

        let (_, listing) = self.absorb(details)?;
        Ok(listing)
    }

    /// Names of the children in response order, or `None` for a file.
    pub async fn list_children(&self) -> Result<Option<Vec<String>>> {
        Ok(self.listing().await?.map(|listing| listing.names()))
    }

    /// Child nodes in response order; empty for a file.
    pub async fn children(&self) -> Result<Vec<Arc<DriveNode>>> {
        Ok(self
            .listing()
            .await?
            .map(|listing| listing.nodes())
            .unwrap_or_default())
    }

    /// Exact, case-sensitive lookup of a child by display name.
    pub async fn get_child(&self, name: &str) -> Result<Arc<DriveNode>> {
        self.listing()
            .await?
            .and_then(|listing| listing.get(name))
            .ok_or_else(|| DriveError::NotFound {
                name: name.to_string(),
            })
    }

    /// Drop cached metadata and listing; the next access fetches again.
    pub fn invalidate(&self) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = NodeState::Unresolved;
        self.store_listing(None);
    }

    pub async fn name(&self) -> Result<String> {
        self.resolve().await?.name()
    }

    pub async fn kind(&self) -> Result<NodeKind> {
        Ok(self.resolve().await?.kind())
    }

    pub async fn size(&self) -> Result<Option<u64>> {
        Ok(self.resolve().await?.size())
    }

    pub async fn date_created(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.resolve().await?.date_created())
    }

    pub async fn date_changed(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.resolve().await?.date_changed())
    }

    pub async fn date_modified(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.resolve().await?.date_modified())
    }

    pub async fn date_last_open(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.resolve().await?.date_last_open())
    }

    /// Open the file's content, buffered or streamed.
    ///
    /// Each call resolves a fresh signed URL. Zero-length files open without
    /// any request.
    #[instrument(skip(self), fields(drivewsid = %self.drivewsid))]
    pub async fn open(&self, stream: bool) -> Result<ContentStream> {
        let metadata = self.resolve().await?;
        let kind = metadata.kind();
        if !kind.is_file() {
            return Err(DriveError::Unreadable {
                name: metadata.name().unwrap_or_else(|_| self.drivewsid.clone()),
                kind: kind.to_string(),
            });
        }

        let size = metadata.size();
        if size == Some(0) {
            debug!("Opening empty file");
            return Ok(ContentStream::empty());
        }

        let docwsid = metadata.docwsid().ok_or_else(|| DriveError::MissingField {
            drivewsid: self.drivewsid.clone(),
            field: "docwsid",
        })?;

        let mut ticket = self
            .gateway
            .download_ticket(docwsid, metadata.zone())
            .await?;
        ticket.size = ticket.size.or(size);

        if stream {
            let reader = self.gateway.fetch_stream(&ticket).await?;
            Ok(ContentStream::streamed(reader, ticket.size))
        } else {
            let body = self.gateway.fetch_bytes(&ticket).await?;
            Ok(ContentStream::buffered(body))
        }
    }

    /// Create a subfolder and drop this folder's cached listing.
    #[instrument(skip(self), fields(parent = %self.drivewsid))]
    pub async fn create_folder(&self, name: &str) -> Result<OperationResult> {
        let result = self.gateway.create_folder(&self.drivewsid, name).await;
        let result = ensure_accepted(result?, name)?;
        info!("Folder created");
        self.invalidate();
        Ok(result)
    }

    /// Rename a child and drop this folder's cached listing.
    #[instrument(skip(self), fields(parent = %self.drivewsid))]
    pub async fn rename_child(&self, name: &str, new_name: &str) -> Result<OperationResult> {
        let child = self.get_child(name).await?;
        let metadata = child.resolve().await?;
        let etag = metadata.require_etag()?;

        let result = self
            .gateway
            .rename(child.drivewsid(), etag, new_name)
            .await?;
        let result = ensure_accepted(result, name)?;
        info!("Item renamed");
        self.invalidate();
        Ok(result)
    }

    /// Move a child to the trash and drop this folder's cached listing.
    #[instrument(skip(self), fields(parent = %self.drivewsid))]
    pub async fn trash_child(&self, name: &str) -> Result<OperationResult> {
        let child = self.get_child(name).await?;
        let metadata = child.resolve().await?;
        let etag = metadata.require_etag()?;

        let result = self
            .gateway
            .move_to_trash(child.drivewsid(), etag)
            .await?;
        let result = ensure_accepted(result, name)?;
        info!("Item moved to trash");
        self.invalidate();
        Ok(result)
    }
}

impl fmt::Debug for DriveNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriveNode")
            .field("drivewsid", &self.drivewsid)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Fail with `RemoteRejected` unless every item reports `OK`.
pub(crate) fn ensure_accepted(result: OperationResult, name: &str) -> Result<OperationResult> {
    if result.items.is_empty() {
        warn!(name, "Operation returned no items");
        return Err(DriveError::RemoteRejected {
            status: "NO_ITEMS".to_string(),
            name: name.to_string(),
        });
    }

    if let Some(rejected) = result.items.iter().find(|item| !item.is_ok()) {
        let status = rejected
            .status
            .clone()
            .unwrap_or_else(|| "UNKNOWN".to_string());
        warn!(name, status = %status, "Operation rejected");
        return Err(DriveError::RemoteRejected {
            status,
            name: rejected.name.clone().unwrap_or_else(|| name.to_string()),
        });
    }

    Ok(result)
}
