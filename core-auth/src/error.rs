use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Web service '{0}' is not available for this account")]
    ServiceUnavailable(String),

    #[error("Failed to load session from {path}: {reason}")]
    SessionLoad { path: String, reason: String },

    #[error("Invalid session data: {0}")]
    InvalidSession(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
