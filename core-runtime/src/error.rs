//! Runtime setup errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tracing subscriber could not be installed
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// Platform capability (such as the HTTP transport) is not available
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
