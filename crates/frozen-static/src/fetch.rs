//! Fetching rendered pages from the running application.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Capability that returns the rendered body for a request path.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request_path: &str) -> Result<String, FetchError>;
}

/// Errors that can occur while fetching a page.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid origin {0}")]
    InvalidOrigin(String),

    #[error("Invalid request path {path}: {message}")]
    InvalidPath { path: String, message: String },

    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Fetches pages over HTTP from a single origin.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    origin: Url,
}

impl HttpFetcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a fetcher for `origin` (e.g. `http://127.0.0.1:5000`).
    pub fn new(origin: &str, timeout: Duration) -> Result<Self, FetchError> {
        let origin = Url::parse(origin)
            .map_err(|e| FetchError::InvalidOrigin(format!("{}: {}", origin, e)))?;

        if origin.cannot_be_a_base() || !matches!(origin.scheme(), "http" | "https") {
            return Err(FetchError::InvalidOrigin(origin.to_string()));
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("frozen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { http, origin })
    }

    /// Same-origin URL for a request path.
    pub fn url_for(&self, request_path: &str) -> Result<Url, FetchError> {
        self.origin
            .join(request_path)
            .map_err(|e| FetchError::InvalidPath {
                path: request_path.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request_path: &str) -> Result<String, FetchError> {
        let url = self.url_for(request_path)?;
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
