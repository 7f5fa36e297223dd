//! Reqwest transport for the iCloud web endpoints

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use futures_util::TryStreamExt;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("icloud-drive/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reqwest-based [`HttpClient`].
///
/// Retries throttled (429) and failed (5xx) requests as well as connection
/// errors with exponential backoff. Content downloads are streamed straight
/// from the response body and are never retried.
///
/// The client sets no overall deadline: callers bound a request through
/// [`HttpRequest::timeout`], and a streamed download only fails once the
/// connection stalls for longer than the idle timeout.
pub struct ReqwestHttpClient {
    client: Client,
    retry_policy: RetryPolicy,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        Self::with_idle_timeout(Duration::from_secs(30))
    }

    /// Client that gives up on a response once no bytes arrive for `idle`.
    pub fn with_idle_timeout(idle: Duration) -> Result<Self> {
        let client = Self::client_builder(idle)
            .build()
            .map_err(|e| {
                BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self::with_client(client))
    }

    fn client_builder(idle: Duration) -> reqwest::ClientBuilder {
        Client::builder()
            .read_timeout(idle)
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(10)
            .user_agent(USER_AGENT)
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy used by [`HttpClient::execute`].
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }

    fn build_request(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(Self::method(request.method), &request.url);

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        builder
    }

    fn classify_error(error: &reqwest::Error) -> BridgeError {
        if error.is_timeout() {
            BridgeError::Timeout(error.to_string())
        } else if error.is_connect() {
            BridgeError::OperationFailed(format!("Connection failed: {}", error))
        } else {
            BridgeError::OperationFailed(error.to_string())
        }
    }

    async fn into_response(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::classify_error(&e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn send_with_policy(
        &self,
        request: &HttpRequest,
        policy: &RetryPolicy,
    ) -> Result<HttpResponse> {
        let attempts = policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = policy.delay_for(attempt - 1);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying request");
                sleep(delay).await;
            }

            match self.build_request(request).send().await {
                Ok(response) if policy.is_retryable_status(response.status().as_u16()) => {
                    let status = response.status().as_u16();
                    warn!(status, attempt, "Retryable HTTP status");
                    last_error = Some(BridgeError::OperationFailed(format!(
                        "HTTP {} after {} attempt(s)",
                        status, attempt
                    )));
                }
                // Non-retryable statuses are interpreted by the caller
                Ok(response) => return Self::into_response(response).await,
                Err(e) => {
                    warn!(error = %e, attempt, "HTTP request failed");
                    last_error = Some(Self::classify_error(&e));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::OperationFailed("All retry attempts exhausted".to_string())
        }))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.send_with_policy(&request, &self.retry_policy).await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        self.send_with_policy(&request, &policy).await
    }

    async fn download_stream(
        &self,
        url: String,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::classify_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::OperationFailed(format!(
                "Download returned HTTP {}",
                status.as_u16()
            )));
        }

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(tokio_util::io::StreamReader::new(stream)))
    }
}
