//! Build endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use frozen_bundles::BundleRegistry;
use frozen_static::{
    BuildConfig, BuildError, BuildLog, FetchError, HttpFetcher, RouteTemplate, StaticBuilder,
    UrlResolver,
};

/// Path the build endpoint is mounted at.
pub const FREEZE_PATH: &str = "/__freeze";

/// Errors that can occur when triggering a build.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("A build is already running")]
    Busy,

    #[error("Request has no usable Host header")]
    MissingHost,

    #[error("Invalid origin: {0}")]
    Origin(#[from] FetchError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match self {
            ServerError::Busy => StatusCode::CONFLICT,
            ServerError::MissingHost | ServerError::Origin(_) => StatusCode::BAD_REQUEST,
            ServerError::Build(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Build failed: {}", self);
        }

        (status, format!("{}\n", self)).into_response()
    }
}

/// Everything a build needs. The origin comes from the request unless pinned
/// with [`FreezeService::with_origin`].
pub struct FreezeService {
    config: BuildConfig,
    origin: Option<String>,
    bundles: Arc<BundleRegistry>,
    resolver: Arc<dyn UrlResolver>,
    timeout: Duration,
    running: Mutex<()>,
}

impl FreezeService {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            origin: None,
            bundles: Arc::new(BundleRegistry::new()),
            resolver: Arc::new(RouteTemplate::default()),
            timeout: HttpFetcher::DEFAULT_TIMEOUT,
            running: Mutex::new(()),
        }
    }

    pub fn with_bundles(mut self, bundles: Arc<BundleRegistry>) -> Self {
        self.bundles = bundles;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn UrlResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Always render from `origin`, ignoring the request's `Host` header.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Origin a build triggered by a request with `headers` renders from.
    pub fn origin_for(&self, headers: &HeaderMap) -> Result<String, ServerError> {
        match &self.origin {
            Some(origin) => Ok(origin.clone()),
            None => request_origin(headers),
        }
    }

    /// Timeout for each page request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build against `origin`. Only one build runs at a time because every
    /// build owns the whole output directory.
    pub async fn run(&self, origin: &str) -> Result<BuildLog, ServerError> {
        let Ok(_guard) = self.running.try_lock() else {
            return Err(ServerError::Busy);
        };

        tracing::info!("Freezing {} into {}", origin, self.config.output_dir.display());

        let fetcher = HttpFetcher::new(origin, self.timeout)?;
        let builder = StaticBuilder::new(self.config.clone(), Arc::new(fetcher))
            .with_bundles(Arc::clone(&self.bundles))
            .with_resolver(Arc::clone(&self.resolver));

        Ok(builder.build().await?)
    }
}

/// Router exposing `GET /__freeze`, to be merged into the host application.
pub fn freeze_router<S>(service: FreezeService) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(FREEZE_PATH, get(freeze_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(service))
}

#[derive(Debug, Default, Deserialize)]
struct FreezeQuery {
    format: Option<String>,
}

/// Handler for the build endpoint.
async fn freeze_handler(
    State(service): State<Arc<FreezeService>>,
    Query(query): Query<FreezeQuery>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let origin = service.origin_for(&headers)?;
    let log = service.run(&origin).await?;

    let status = if log.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    if query.format.as_deref() == Some("json") {
        return Ok((status, Json(log)).into_response());
    }

    Ok((status, log.to_string()).into_response())
}

/// Origin of the inbound request, honoring `X-Forwarded-Proto`.
fn request_origin(headers: &HeaderMap) -> Result<String, ServerError> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|h| !h.is_empty() && !h.contains(['/', '\\', ' ', '@']))
        .ok_or(ServerError::MissingHost)?;

    let scheme = match headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .map(|p| p.trim().to_ascii_lowercase())
    {
        Some(p) if p == "https" => "https",
        _ => "http",
    };

    Ok(format!("{}://{}/", scheme, host))
}
