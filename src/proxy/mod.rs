//! Server-side proxies for the photo-search and search-analytics APIs.
//!
//! Both endpoints add server-held credentials to the caller's request and
//! normalize every failure into the [`ErrorResponse`](error::ErrorResponse) envelope.

mod analytics;
mod error;
mod google_auth;
mod photos;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ProxyConfig;

pub use error::ProxyError;

/// Route of the photo-search proxy.
pub const PHOTOS_ROUTE: &str = "/api/pexels";

/// Route of the search-analytics proxy.
pub const ANALYTICS_ROUTE: &str = "/api/gsc";

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials and settings read from the process environment.
#[derive(Debug, Clone, Default)]
pub struct ProxyEnv {
    /// `PEXELS_API_KEY`
    pub pexels_api_key: Option<String>,
    /// `GOOGLE_SERVICE_ACCOUNT_JSON`: a service-account key file's contents
    pub service_account_json: Option<String>,
    /// `GSC_SITE_URL`: the Search Console property, e.g. `sc-domain:example.com`
    pub site_url: Option<String>,
}

impl ProxyEnv {
    pub fn from_env() -> Self {
        Self {
            pexels_api_key: non_empty_var("PEXELS_API_KEY"),
            service_account_json: non_empty_var("GOOGLE_SERVICE_ACCOUNT_JSON"),
            site_url: non_empty_var("GSC_SITE_URL"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Shared state for the proxy handlers.
pub struct AppState {
    pub http: reqwest::Client,
    pub config: ProxyConfig,
    pub env: ProxyEnv,
}

impl AppState {
    pub fn new(config: ProxyConfig, env: ProxyEnv, http: reqwest::Client) -> Self {
        Self { http, config, env }
    }
}

/// Creates the HTTP client used for upstream requests.
pub fn create_http_client() -> Result<reqwest::Client, ProxyError> {
    Ok(reqwest::Client::builder()
        .timeout(UPSTREAM_TIMEOUT)
        .user_agent(concat!("fencesite/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Permissive cross-origin policy; the browser widget may be hosted anywhere.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Answers a bare `OPTIONS` request that is not a CORS pre-flight.
async fn options_ok() -> StatusCode {
    StatusCode::OK
}

/// Build the router serving both proxy endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(PHOTOS_ROUTE, get(photos::handle).options(options_ok))
        .route(ANALYTICS_ROUTE, get(analytics::handle).options(options_ok))
        .layer(cors_layer())
        .with_state(state)
}
