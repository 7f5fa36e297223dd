//! # Host Bridge Traits
//!
//! Platform abstraction traits the iCloud core consumes but does not implement.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP transport with retry and byte streaming
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! let http_client = config.http_client
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "HttpClient".to_string(),
//!         message: "No HTTP client implementation provided. \
//!                  Desktop: ensure the desktop-shims feature is enabled.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Implementations
//! should convert platform-specific errors into it and keep messages actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single client can be shared by
//! every drive node through an `Arc`.

pub mod error;
pub mod http;
pub mod logging;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
