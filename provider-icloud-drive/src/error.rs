//! Error types for the iCloud Drive provider

use thiserror::Error;

/// iCloud Drive errors
#[derive(Error, Debug)]
pub enum DriveError {
    /// Child name not present in a folder listing
    #[error("No child named '{name}' exists")]
    NotFound { name: String },

    /// Remote reported a non-success status for a listing
    #[error("No items in folder, status: {status}")]
    ListingUnavailable { status: String },

    /// Content open attempted on a node that is not a file
    #[error("'{name}' is not a file ({kind}) and cannot be opened")]
    Unreadable { name: String, kind: String },

    /// Signed download URL could not be resolved or fetched
    #[error("Download unavailable: {0}")]
    DownloadUnavailable(String),

    /// Recover / delete / rename rejected by the remote for one item
    #[error("Operation on '{name}' rejected by iCloud, status: {status}")]
    RemoteRejected { status: String, name: String },

    /// Node has no name and none can be derived from its identifier
    #[error("Name unavailable for item {drivewsid}")]
    NameUnavailable { drivewsid: String },

    /// Descriptor lacks a field an operation needs
    #[error("Item {drivewsid} has no {field}")]
    MissingField {
        drivewsid: String,
        field: &'static str,
    },

    /// API request returned a non-success HTTP status
    #[error("iCloud API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Session problem (missing service, unauthenticated)
    #[error(transparent)]
    Auth(#[from] core_auth::AuthError),

    /// Transport error
    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

/// Result type for iCloud Drive operations
pub type Result<T> = std::result::Result<T, DriveError>;

impl From<DriveError> for bridge_traits::error::BridgeError {
    fn from(error: DriveError) -> Self {
        match error {
            DriveError::Bridge(e) => e,
            other => bridge_traits::error::BridgeError::OperationFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DriveError::NotFound {
            name: "not_exists".to_string(),
        };
        assert_eq!(error.to_string(), "No child named 'not_exists' exists");

        let error = DriveError::ListingUnavailable {
            status: "ID_INVALID".to_string(),
        };
        assert_eq!(error.to_string(), "No items in folder, status: ID_INVALID");

        let error = DriveError::ApiError {
            status_code: 421,
            message: "Misdirected Request".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "iCloud API error (status 421): Misdirected Request"
        );
    }

    #[test]
    fn test_error_conversion() {
        let error = DriveError::RemoteRejected {
            status: "ETAG_CONFLICT".to_string(),
            name: "report.pdf".to_string(),
        };
        let bridge_error: bridge_traits::error::BridgeError = error.into();

        assert!(matches!(
            bridge_error,
            bridge_traits::error::BridgeError::OperationFailed(msg) if msg.contains("ETAG_CONFLICT")
        ));
    }

    #[test]
    fn test_bridge_error_passes_through() {
        let error = DriveError::Bridge(bridge_traits::error::BridgeError::Timeout(
            "30s".to_string(),
        ));
        let bridge_error: bridge_traits::error::BridgeError = error.into();
        assert!(matches!(
            bridge_error,
            bridge_traits::error::BridgeError::Timeout(_)
        ));
    }
}
