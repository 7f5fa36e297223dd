//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! - `HttpClient` using `reqwest` with rustls, connection pooling and
//!   exponential-backoff retries for transient failures
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let connector = IcloudDriveConnector::new(http_client, session);
//! ```

mod http;

pub use http::ReqwestHttpClient;
