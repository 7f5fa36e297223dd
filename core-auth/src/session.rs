//! Authenticated iCloud session.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{AuthError, Result};

/// Web service key for the Drive metadata API.
pub const DRIVEWS_SERVICE: &str = "drivews";

/// Web service key for the document (download) API.
pub const DOCWS_SERVICE: &str = "docws";

const HOME_ENDPOINT: &str = "https://www.icloud.com";
const CLIENT_BUILD_NUMBER: &str = "17DHotfix5";
const CLIENT_MASTERING_NUMBER: &str = "17DHotfix5";

/// Endpoint advertised by the account for one web service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// An authenticated iCloud web session.
///
/// # Examples
///
/// ```
/// use core_auth::Session;
///
/// let session = Session::from_json(r#"{
///     "dsid": "1234567890",
///     "cookies": {"X-APPLE-WEBAUTH-TOKEN": "v=2:t=abc"},
///     "webservices": {
///         "drivews": {"url": "https://p00-drivews.icloud.com:443", "status": "active"}
///     }
/// }"#).unwrap();
///
/// assert_eq!(session.service_url("drivews").unwrap(), "https://p00-drivews.icloud.com:443");
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    /// Directory services id of the signed-in account
    pub dsid: String,

    /// Client id sent with every request; generated when absent
    #[serde(default = "generate_client_id")]
    pub client_id: String,

    /// Web-auth cookies, name → value
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,

    /// Web service endpoints keyed by service name
    #[serde(default)]
    pub webservices: BTreeMap<String, ServiceEndpoint>,
}

fn generate_client_id() -> String {
    uuid::Uuid::new_v4().to_string().to_uppercase()
}

impl Session {
    /// Create a session with a fresh client id.
    pub fn new(dsid: impl Into<String>) -> Self {
        Self {
            dsid: dsid.into(),
            client_id: generate_client_id(),
            cookies: BTreeMap::new(),
            webservices: BTreeMap::new(),
        }
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_service(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.webservices.insert(
            name.into(),
            ServiceEndpoint {
                url: url.into(),
                status: Some("active".to_string()),
            },
        );
        self
    }

    /// Parse a serialized session.
    pub fn from_json(json: &str) -> Result<Self> {
        let session: Session = serde_json::from_str(json)
            .map_err(|e| AuthError::InvalidSession(e.to_string()))?;
        session.validate()?;
        Ok(session)
    }

    /// Load a serialized session from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading session");

        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuthError::SessionLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let session = Self::from_json(&json)?;
        info!(
            services = session.webservices.len(),
            "Loaded iCloud session"
        );
        Ok(session)
    }

    /// Reject sessions that cannot authenticate any request.
    pub fn validate(&self) -> Result<()> {
        if self.dsid.trim().is_empty() {
            return Err(AuthError::InvalidSession("dsid is empty".to_string()));
        }
        if self.cookies.is_empty() {
            return Err(AuthError::NotAuthenticated);
        }
        Ok(())
    }

    /// Base URL of a web service, without trailing slash.
    pub fn service_url(&self, service: &str) -> Result<&str> {
        self.webservices
            .get(service)
            .map(|endpoint| endpoint.url.trim_end_matches('/'))
            .ok_or_else(|| AuthError::ServiceUnavailable(service.to_string()))
    }

    /// Query parameters identifying the client and account.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("clientBuildNumber", CLIENT_BUILD_NUMBER.to_string()),
            ("clientMasteringNumber", CLIENT_MASTERING_NUMBER.to_string()),
            ("clientId", self.client_id.clone()),
            ("dsid", self.dsid.clone()),
        ]
    }

    /// Headers carrying the session credentials.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Origin".to_string(), HOME_ENDPOINT.to_string()),
            ("Referer".to_string(), format!("{}/", HOME_ENDPOINT)),
        ];
        if !self.cookies.is_empty() {
            headers.push(("Cookie".to_string(), self.cookie_header()));
        }
        headers
    }

    fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("dsid", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("cookies", &format!("[{} REDACTED]", self.cookies.len()))
            .field("webservices", &self.webservices)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Session {
        Session::new("1234567890")
            .with_cookie("X-APPLE-WEBAUTH-TOKEN", "v=2:t=abc")
            .with_cookie("X-APPLE-WEBAUTH-USER", "v=1:s=0")
            .with_service(DRIVEWS_SERVICE, "https://p00-drivews.icloud.com:443/")
            .with_service(DOCWS_SERVICE, "https://p00-docws.icloud.com:443")
    }

    #[test]
    fn test_service_url_trims_trailing_slash() {
        let session = sample();
        assert_eq!(
            session.service_url(DRIVEWS_SERVICE).unwrap(),
            "https://p00-drivews.icloud.com:443"
        );
        assert!(matches!(
            session.service_url("findme"),
            Err(AuthError::ServiceUnavailable(name)) if name == "findme"
        ));
    }

    #[test]
    fn test_headers_include_sorted_cookies() {
        let headers = sample().headers();
        let cookie = headers
            .iter()
            .find(|(k, _)| k == "Cookie")
            .map(|(_, v)| v.as_str())
            .unwrap();
        assert_eq!(
            cookie,
            "X-APPLE-WEBAUTH-TOKEN=v=2:t=abc; X-APPLE-WEBAUTH-USER=v=1:s=0"
        );
        assert!(headers.iter().any(|(k, v)| k == "Origin" && v == HOME_ENDPOINT));
    }

    #[test]
    fn test_query_params_carry_identity() {
        let session = sample();
        let params = session.query_params();
        assert!(params.contains(&("dsid", "1234567890".to_string())));
        assert!(params.contains(&("clientId", session.client_id.clone())));
    }

    #[test]
    fn test_from_json_generates_client_id() {
        let session = Session::from_json(
            r#"{"dsid": "42", "cookies": {"X-APPLE-WEBAUTH-TOKEN": "t"}}"#,
        )
        .unwrap();
        assert!(!session.client_id.is_empty());
        assert_eq!(session.client_id, session.client_id.to_uppercase());
    }

    #[test]
    fn test_validation_rejects_unauthenticated() {
        assert!(matches!(
            Session::from_json(r#"{"dsid": "42"}"#),
            Err(AuthError::NotAuthenticated)
        ));
        assert!(matches!(
            Session::from_json(r#"{"dsid": " ", "cookies": {"a": "b"}}"#),
            Err(AuthError::InvalidSession(_))
        ));
        assert!(matches!(
            Session::from_json("not json"),
            Err(AuthError::InvalidSession(_))
        ));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("v=2:t=abc"));
        assert!(!rendered.contains("1234567890"));
    }

    #[tokio::test]
    async fn test_load_round_trip_from_disk() {
        let path = std::env::temp_dir().join(format!("session-{}.json", uuid::Uuid::new_v4()));
        let json = serde_json::to_string(&sample()).unwrap();
        tokio::fs::write(&path, json).await.unwrap();

        let loaded = Session::load(&path).await.unwrap();
        assert_eq!(loaded.dsid, "1234567890");
        assert_eq!(loaded.cookies.len(), 2);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = Session::load("/nonexistent/session.json").await;
        assert!(matches!(result, Err(AuthError::SessionLoad { .. })));
    }
}
