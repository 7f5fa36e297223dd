//! iCloud Drive API connector implementation
//!
//! Implements the `DriveGateway` trait over the iCloud `drivews` and `docws`
//! web services.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use core_auth::{Session, DOCWS_SERVICE, DRIVEWS_SERVICE};
use core_runtime::logging::strip_query;
use core_runtime::CoreConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{DriveError, Result};
use crate::gateway::{DriveGateway, TRASH_ROOT_ID};
use crate::types::{
    ContentBody, CreateFoldersRequest, CreateFoldersResponse, DownloadTicket, DownloadTokenResponse,
    ItemDetails, ItemRef, ItemsRequest, NewFolder, NodeDetailsRequest, OperationResult,
};

const DEFAULT_ZONE: &str = "com.apple.CloudDocs";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);
const ERROR_BODY_LIMIT: usize = 512;

/// iCloud Drive API connector
///
/// Attaches the session's identity query parameters and credential headers
/// to every `drivews`/`docws` request. Signed download URLs are fetched
/// without credentials.
///
/// # Example
///
/// ```ignore
/// use provider_icloud_drive::{DriveGateway, IcloudDriveConnector};
///
/// let connector = IcloudDriveConnector::new(http_client, session);
/// let root = connector.node_details("FOLDER::com.apple.CloudDocs::root").await?;
/// ```
pub struct IcloudDriveConnector {
    http_client: Arc<dyn HttpClient>,
    session: Session,
    zone: String,
    request_timeout: Duration,
    download_timeout: Duration,
}

impl IcloudDriveConnector {
    /// Create a connector with default zone and timeouts.
    pub fn new(http_client: Arc<dyn HttpClient>, session: Session) -> Self {
        Self {
            http_client,
            session,
            zone: DEFAULT_ZONE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }

    /// Create a connector using the transport, zone and timeouts of `config`.
    pub fn from_config(config: &CoreConfig, session: Session) -> Self {
        Self {
            http_client: Arc::clone(&config.http_client),
            session,
            zone: config.zone.clone(),
            request_timeout: config.request_timeout,
            download_timeout: config.download_timeout,
        }
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = zone.into();
        self
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Build a service URL carrying the session query parameters.
    fn service_url(
        &self,
        service: &str,
        path: &str,
        extra: &[(&str, &str)],
    ) -> Result<String> {
        let base = self.session.service_url(service)?;
        let mut params: Vec<(&str, String)> = self.session.query_params();
        params.extend(extra.iter().map(|(k, v)| (*k, v.to_string())));

        let url = Url::parse_with_params(&format!("{}/{}", base, path), &params)
            .map_err(|e| DriveError::ParseError(format!("Invalid service URL: {}", e)))?;
        Ok(url.into())
    }

    fn authenticated(&self, method: HttpMethod, url: String) -> HttpRequest {
        HttpRequest::new(method, url)
            .headers(self.session.headers())
            .header("Accept", "application/json")
            .timeout(self.request_timeout)
    }

    /// Execute a request and map non-success statuses to `ApiError`.
    async fn send(&self, request: HttpRequest, delivery: Delivery) -> Result<HttpResponse> {
        debug!(
            method = request.method.as_str(),
            url = strip_query(&request.url),
            ?delivery,
            "Sending iCloud request"
        );
        let response = match delivery {
            Delivery::Retryable => self.http_client.execute(request).await?,
            Delivery::Once => {
                self.http_client
                    .execute_with_retry(request, RetryPolicy::no_retry())
                    .await?
            }
        };

        if response.is_success() {
            Ok(response)
        } else {
            warn!(status = response.status, "iCloud request failed");
            Err(DriveError::ApiError {
                status_code: response.status,
                message: response.snippet(ERROR_BODY_LIMIT),
            })
        }
    }

    async fn post_drivews<B, T>(&self, path: &str, body: &B, delivery: Delivery) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.service_url(DRIVEWS_SERVICE, path, &[])?;
        let request = self.authenticated(HttpMethod::Post, url).json(body)?;
        let response = self.send(request, delivery).await?;
        parse_json(&response)
    }

    async fn item_operation(
        &self,
        path: &str,
        items: Vec<ItemRef<'_>>,
    ) -> Result<OperationResult> {
        self.post_drivews(path, &ItemsRequest { items }, Delivery::Once)
            .await
    }

    async fn resolve_ticket(&self, docwsid: &str, zone: &str) -> Result<DownloadTicket> {
        let url = self.service_url(
            DOCWS_SERVICE,
            &format!("ws/{}/download/by_id", zone),
            &[("document_id", docwsid)],
        )?;
        let response = self
            .send(self.authenticated(HttpMethod::Get, url), Delivery::Retryable)
            .await?;
        let tokens: DownloadTokenResponse = parse_json(&response)?;

        let token = tokens
            .data_token
            .or(tokens.package_token)
            .ok_or_else(|| DriveError::ParseError("Response carries no download token".to_string()))?;

        Ok(DownloadTicket {
            url: token.url,
            size: None,
        })
    }
}

/// Whether the transport may re-send a request after a transient failure.
///
/// Mutations are sent once: a retried `createFolders` or `deleteItems` can
/// apply twice or report an error for a change that already committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Retryable,
    Once,
}

fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|e| DriveError::ParseError(e.to_string()))
}

fn download_error(error: DriveError) -> DriveError {
    match error {
        DriveError::Auth(_) | DriveError::DownloadUnavailable(_) => error,
        other => DriveError::DownloadUnavailable(other.to_string()),
    }
}

#[async_trait]
impl DriveGateway for IcloudDriveConnector {
    #[instrument(skip(self))]
    async fn node_details(&self, drivewsid: &str) -> Result<ItemDetails> {
        let body = [NodeDetailsRequest {
            drivewsid,
            partial_data: false,
        }];
        let details: Vec<ItemDetails> = self
            .post_drivews("retrieveItemDetailsInFolders", &body, Delivery::Retryable)
            .await?;

        let details = details.into_iter().next().ok_or_else(|| {
            DriveError::ParseError(format!("Empty details response for {}", drivewsid))
        })?;

        debug!(
            children = details.items.as_ref().map(Vec::len),
            status = details.status.as_deref(),
            "Fetched item details"
        );
        Ok(details)
    }

    #[instrument(skip(self))]
    async fn trash_details(&self) -> Result<ItemDetails> {
        info!("Fetching trash listing");
        self.node_details(TRASH_ROOT_ID).await
    }

    #[instrument(skip(self, etag))]
    async fn recover_from_trash(&self, drivewsid: &str, etag: &str) -> Result<OperationResult> {
        info!("Recovering item from trash");
        self.item_operation(
            "putBackItemsFromTrash",
            vec![ItemRef {
                drivewsid,
                etag,
                client_id: None,
                name: None,
            }],
        )
        .await
    }

    #[instrument(skip(self, etag))]
    async fn delete_forever(&self, drivewsid: &str, etag: &str) -> Result<OperationResult> {
        info!("Deleting item permanently");
        self.item_operation(
            "deleteItems",
            vec![ItemRef {
                drivewsid,
                etag,
                client_id: None,
                name: None,
            }],
        )
        .await
    }

    #[instrument(skip(self, etag))]
    async fn move_to_trash(&self, drivewsid: &str, etag: &str) -> Result<OperationResult> {
        info!("Moving item to trash");
        self.item_operation(
            "moveItemsToTrash",
            vec![ItemRef {
                drivewsid,
                etag,
                client_id: Some(self.session.client_id.as_str()),
                name: None,
            }],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn create_folder(&self, parent: &str, name: &str) -> Result<OperationResult> {
        info!("Creating folder");
        let body = CreateFoldersRequest {
            destination_drivews_id: parent,
            folders: vec![NewFolder {
                client_id: format!("FOLDER::UNKNOWN_ZONE::TempId-{}", uuid::Uuid::new_v4()),
                name,
            }],
        };
        let response: CreateFoldersResponse = self
            .post_drivews("createFolders", &body, Delivery::Once)
            .await?;
        Ok(OperationResult {
            items: response.folders,
        })
    }

    #[instrument(skip(self, etag))]
    async fn rename(&self, drivewsid: &str, etag: &str, name: &str) -> Result<OperationResult> {
        info!("Renaming item");
        self.item_operation(
            "renameItems",
            vec![ItemRef {
                drivewsid,
                etag,
                client_id: None,
                name: Some(name),
            }],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn download_ticket(&self, docwsid: &str, zone: Option<&str>) -> Result<DownloadTicket> {
        let zone = zone.unwrap_or(&self.zone);
        let ticket = self
            .resolve_ticket(docwsid, zone)
            .await
            .map_err(download_error)?;
        debug!(url = strip_query(&ticket.url), "Resolved download URL");
        Ok(ticket)
    }

    #[instrument(skip(self, ticket), fields(url = strip_query(&ticket.url)))]
    async fn fetch_bytes(&self, ticket: &DownloadTicket) -> Result<ContentBody> {
        let request =
            HttpRequest::new(HttpMethod::Get, ticket.url.clone()).timeout(self.download_timeout);
        let response = self
            .send(request, Delivery::Retryable)
            .await
            .map_err(download_error)?;

        info!(bytes = response.body.len(), "Downloaded content");
        Ok(ContentBody {
            content_type: response.header("Content-Type").map(str::to_string),
            bytes: response.body,
        })
    }

    #[instrument(skip(self, ticket), fields(url = strip_query(&ticket.url)))]
    async fn fetch_stream(
        &self,
        ticket: &DownloadTicket,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
        info!("Opening content stream");
        self.http_client
            .download_stream(ticket.url.clone())
            .await
            .map_err(|e| DriveError::DownloadUnavailable(e.to_string()))
    }
}
