//! Drive service entry point
//!
//! [`DriveService`] hands out the session's drive root and trash view. Both
//! are created on first use and the same instances are returned afterwards;
//! all caching below that lives on the nodes themselves.

use bridge_traits::http::HttpClient;
use core_auth::Session;
use core_runtime::CoreConfig;
use std::sync::{Arc, OnceLock};
use tracing::info;

use crate::connector::IcloudDriveConnector;
use crate::error::Result;
use crate::gateway::{DriveGateway, ROOT_ID};
use crate::node::DriveNode;
use crate::trash::TrashView;

/// iCloud Drive for one authenticated session.
///
/// # Example
///
/// ```ignore
/// use provider_icloud_drive::DriveService;
///
/// let drive = DriveService::connect(&config).await?;
/// for name in drive.root().list_children().await?.unwrap_or_default() {
///     println!("{}", name);
/// }
/// let report = drive.get("pyiCloud").await?.get_child("Test").await?;
/// ```
pub struct DriveService {
    gateway: Arc<dyn DriveGateway>,
    root_id: String,
    root: OnceLock<Arc<DriveNode>>,
    trash: OnceLock<TrashView>,
}

impl DriveService {
    /// Service over an arbitrary gateway, rooted at the default zone.
    pub fn new(gateway: Arc<dyn DriveGateway>) -> Self {
        Self::with_root(gateway, ROOT_ID)
    }

    pub fn with_root(gateway: Arc<dyn DriveGateway>, root_id: impl Into<String>) -> Self {
        Self {
            gateway,
            root_id: root_id.into(),
            root: OnceLock::new(),
            trash: OnceLock::new(),
        }
    }

    /// Service over the iCloud web API for an already loaded session.
    pub fn from_session(http_client: Arc<dyn HttpClient>, session: Session) -> Self {
        Self::new(Arc::new(IcloudDriveConnector::new(http_client, session)))
    }

    /// Service using the transport, zone and timeouts of `config`.
    pub fn from_config(config: &CoreConfig, session: Session) -> Self {
        let connector = IcloudDriveConnector::from_config(config, session);
        Self::with_root(
            Arc::new(connector),
            format!("FOLDER::{}::root", config.zone),
        )
    }

    /// Load the session named by `config` and build the service.
    pub async fn connect(config: &CoreConfig) -> Result<Self> {
        let session = Session::load(&config.session_path).await?;
        info!(zone = %config.zone, "Connected to iCloud Drive");
        Ok(Self::from_config(config, session))
    }

    pub fn gateway(&self) -> &Arc<dyn DriveGateway> {
        &self.gateway
    }

    /// The drive root; the same node on every call.
    pub fn root(&self) -> Arc<DriveNode> {
        Arc::clone(self.root.get_or_init(|| {
            Arc::new(DriveNode::new(Arc::clone(&self.gateway), self.root_id.clone()))
        }))
    }

    /// The trash view; the same view on every call.
    pub fn trash(&self) -> &TrashView {
        self.trash
            .get_or_init(|| TrashView::new(Arc::clone(&self.gateway)))
    }

    /// Child of the root by name.
    pub async fn get(&self, name: &str) -> Result<Arc<DriveNode>> {
        self.root().get_child(name).await
    }

    /// Walk a `/`-separated path of names from the root.
    ///
    /// Empty segments are ignored, so `""` and `"/"` name the root.
    pub async fn resolve_path(&self, path: &str) -> Result<Arc<DriveNode>> {
        let mut node = self.root();
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            node = node.get_child(segment).await?;
        }
        Ok(node)
    }
}

impl std::fmt::Debug for DriveService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveService")
            .field("root_id", &self.root_id)
            .field("root", &self.root.get())
            .finish()
    }
}
