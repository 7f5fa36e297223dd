//! # Core Configuration Module
//!
//! Configuration for an iCloud Drive session.
//!
//! ## Overview
//!
//! The configuration uses a builder to construct a `CoreConfig` holding the
//! transport and the settings the drive layer needs. It validates eagerly so
//! a misconfigured session fails before the first request is made.
//!
//! ## Required
//!
//! - `session_path` - serialized authenticated session (see `core_auth::Session`)
//!
//! ## Optional (with defaults)
//!
//! - `HttpClient` - desktop default: `ReqwestHttpClient` (requires the
//!   `desktop-shims` feature; otherwise it must be injected)
//! - `request_timeout` - 30 seconds
//! - `download_timeout` - 5 minutes
//! - `zone` - `com.apple.CloudDocs`
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .session_path("~/.config/icloud/session.json")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default iCloud Drive zone.
pub const DEFAULT_ZONE: &str = "com.apple.CloudDocs";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);
const MAX_TIMEOUT: Duration = Duration::from_secs(600);

/// Core configuration for an iCloud Drive session.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the serialized authenticated session
    pub session_path: PathBuf,

    /// HTTP transport shared by every drive node
    pub http_client: Arc<dyn HttpClient>,

    /// Timeout for metadata and mutation requests
    pub request_timeout: Duration,

    /// Timeout for buffered content downloads
    pub download_timeout: Duration,

    /// Drive zone used for document downloads
    pub zone: String,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("session_path", &self.session_path)
            .field("http_client", &"HttpClient { ... }")
            .field("request_timeout", &self.request_timeout)
            .field("download_timeout", &self.download_timeout)
            .field("zone", &self.zone)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Session path is not empty
    /// - Timeouts are non-zero and at most 10 minutes
    /// - Zone is not empty
    pub fn validate(&self) -> Result<()> {
        if self.session_path.as_os_str().is_empty() {
            return Err(Error::Config("Session path cannot be empty".to_string()));
        }

        for (label, timeout) in [
            ("Request timeout", self.request_timeout),
            ("Download timeout", self.download_timeout),
        ] {
            if timeout.is_zero() {
                return Err(Error::Config(format!("{} must be greater than 0", label)));
            }
            if timeout > MAX_TIMEOUT {
                return Err(Error::Config(format!(
                    "{} exceeds maximum of {} seconds",
                    label,
                    MAX_TIMEOUT.as_secs()
                )));
            }
        }

        if self.zone.trim().is_empty() {
            return Err(Error::Config("Zone cannot be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for iCloud requests. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Otherwise inject an implementation with .http_client()."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(idle_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_idle_timeout(idle_timeout)
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    session_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    request_timeout: Option<Duration>,
    download_timeout: Option<Duration>,
    zone: Option<String>,
}

impl CoreConfigBuilder {
    /// Sets the path of the serialized session.
    pub fn session_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.session_path = Some(path.into());
        self
    }

    /// Injects an HTTP client instead of the desktop default.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the timeout for metadata and mutation requests.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the timeout for buffered downloads.
    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = Some(timeout);
        self
    }

    /// Sets the drive zone.
    pub fn zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Builds the final configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when the session path is missing or a value is out of range
    /// - [`Error::CapabilityMissing`] when no HTTP client is injected and the
    ///   `desktop-shims` feature is off
    pub fn build(self) -> Result<CoreConfig> {
        let session_path = self.session_path.ok_or_else(|| {
            Error::Config("Session path is required. Use .session_path() to set it.".to_string())
        })?;

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let download_timeout = self.download_timeout.unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT);

        // Requests carry their own deadline; the client only bounds idle reads
        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let config = CoreConfig {
            session_path,
            http_client,
            request_timeout,
            download_timeout,
            zone: self.zone.unwrap_or_else(|| DEFAULT_ZONE.to_string()),
        };

        config.validate()?;

        Ok(config)
    }
}
