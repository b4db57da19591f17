//! Photo-search proxy (`GET /api/pexels`).
//!
//! Validates the caller's `action` and parameters, adds the API key and
//! returns the upstream JSON body unchanged.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use super::AppState;
use super::error::{ErrorResponse, ProxyError};

const DEFAULT_PAGE: &str = "1";
const DEFAULT_PER_PAGE: &str = "15";

/// Raw query parameters. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct PhotoQuery {
    pub action: Option<String>,
    pub query: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub orientation: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub id: Option<String>,
}

/// A validated upstream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoRequest {
    Search {
        query: String,
        page: String,
        per_page: String,
        orientation: Option<String>,
        size: Option<String>,
        color: Option<String>,
    },
    Curated {
        page: String,
        per_page: String,
    },
    Photo {
        id: String,
    },
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl PhotoRequest {
    pub fn from_query(query: PhotoQuery) -> Result<Self, ErrorResponse> {
        let page = present(query.page).unwrap_or_else(|| DEFAULT_PAGE.to_string());
        let per_page = present(query.per_page).unwrap_or_else(|| DEFAULT_PER_PAGE.to_string());

        match present(query.action).as_deref() {
            Some("search") => {
                let search = present(query.query).ok_or_else(|| {
                    ErrorResponse::bad_request("Query parameter is required for search")
                })?;
                Ok(PhotoRequest::Search {
                    query: search,
                    page,
                    per_page,
                    orientation: present(query.orientation),
                    size: present(query.size),
                    color: present(query.color),
                })
            }
            Some("curated") => Ok(PhotoRequest::Curated { page, per_page }),
            Some("photo") => {
                let id = present(query.id)
                    .ok_or_else(|| ErrorResponse::bad_request("Photo ID is required"))?;
                Ok(PhotoRequest::Photo { id })
            }
            _ => Err(ErrorResponse::bad_request("Invalid action parameter")),
        }
    }

    /// The upstream URL for this request under `base_url`.
    pub fn upstream_url(&self, base_url: &str) -> Result<Url, ProxyError> {
        let mut url = Url::parse(base_url)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ProxyError::BaseUrl(base_url.to_string()))?;
            segments.pop_if_empty();
            match self {
                PhotoRequest::Search { .. } => {
                    segments.push("search");
                }
                PhotoRequest::Curated { .. } => {
                    segments.push("curated");
                }
                PhotoRequest::Photo { id } => {
                    segments.push("photos").push(id);
                }
            }
        }

        match self {
            PhotoRequest::Search {
                query,
                page,
                per_page,
                orientation,
                size,
                color,
            } => {
                let mut pairs = url.query_pairs_mut();
                pairs
                    .append_pair("query", query)
                    .append_pair("page", page)
                    .append_pair("per_page", per_page);
                for (key, value) in [("orientation", orientation), ("size", size), ("color", color)] {
                    if let Some(value) = value {
                        pairs.append_pair(key, value);
                    }
                }
            }
            PhotoRequest::Curated { page, per_page } => {
                url.query_pairs_mut()
                    .append_pair("page", page)
                    .append_pair("per_page", per_page);
            }
            PhotoRequest::Photo { .. } => {}
        }

        Ok(url)
    }
}

/// Fetch the upstream body, checking that it is JSON but not altering it.
async fn fetch(client: &reqwest::Client, url: Url, api_key: &str) -> Result<Bytes, ProxyError> {
    let response = client
        .get(url)
        .header(header::AUTHORIZATION, api_key)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ProxyError::from_response(response).await);
    }

    let body = response.bytes().await?;
    serde_json::from_slice::<IgnoredAny>(&body)?;
    Ok(body)
}

pub async fn handle(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PhotoQuery>,
) -> Result<Response, ErrorResponse> {
    let request = PhotoRequest::from_query(query)?;

    let api_key = state.env.pexels_api_key.as_deref().ok_or_else(|| {
        ErrorResponse::configuration("PEXELS_API_KEY environment variable is not set").with_setup(
            json!({
                "step1": "Create a Pexels account and request an API key at https://www.pexels.com/api/",
                "step2": "Add PEXELS_API_KEY to the server environment",
            }),
        )
    })?;

    let url = request
        .upstream_url(&state.config.pexels_base_url)
        .map_err(upstream_error)?;
    debug!(%url, "forwarding photo request");

    let body = fetch(&state.http, url, api_key)
        .await
        .map_err(upstream_error)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

fn upstream_error(e: ProxyError) -> ErrorResponse {
    warn!(error = %e, "photo API request failed");
    ErrorResponse::upstream("Failed to fetch from Pexels API").with_details(json!(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;
    use crate::proxy::ProxyEnv;
    use crate::proxy::test_support::*;
    use axum::Router;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get as get_route;

    fn env_with_key() -> ProxyEnv {
        ProxyEnv {
            pexels_api_key: Some("test-key".to_string()),
            ..ProxyEnv::default()
        }
    }

    fn config_for(base_url: &str) -> ProxyConfig {
        ProxyConfig {
            pexels_base_url: base_url.to_string(),
            ..ProxyConfig::default()
        }
    }

    /// Fake upstream that echoes what it received.
    fn fake_pexels() -> Router {
        async fn search(
            headers: HeaderMap,
            Query(params): Query<std::collections::BTreeMap<String, String>>,
        ) -> axum::Json<serde_json::Value> {
            axum::Json(json!({
                "auth": headers.get("authorization").and_then(|v| v.to_str().ok()),
                "params": params,
                "photos": [],
            }))
        }

        async fn photo(Path(id): Path<String>) -> Response {
            if id == "404" {
                return (StatusCode::NOT_FOUND, "Not Found").into_response();
            }
            // Deliberately unsorted keys: the body must come back untouched
            ([(header::CONTENT_TYPE, "application/json")], format!("{{\"z\":1,\"id\":\"{id}\",\"a\":2}}"))
                .into_response()
        }

        Router::new()
            .route("/v1/search", get_route(search))
            .route("/v1/curated", get_route(search))
            .route("/v1/photos/{id}", get_route(photo))
    }

    #[test]
    fn test_from_query_defaults() {
        let request = PhotoRequest::from_query(PhotoQuery {
            action: Some("curated".to_string()),
            page: Some(String::new()),
            ..PhotoQuery::default()
        })
        .unwrap();
        assert_eq!(
            request,
            PhotoRequest::Curated {
                page: "1".to_string(),
                per_page: "15".to_string(),
            }
        );
    }

    #[test]
    fn test_search_url_includes_optional_filters() {
        let request = PhotoRequest::Search {
            query: "wood fence".to_string(),
            page: "2".to_string(),
            per_page: "30".to_string(),
            orientation: Some("landscape".to_string()),
            size: None,
            color: Some("brown".to_string()),
        };
        let url = request.upstream_url("https://api.pexels.com/v1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.pexels.com/v1/search?query=wood+fence&page=2&per_page=30&orientation=landscape&color=brown"
        );
    }

    #[test]
    fn test_photo_url_encodes_id() {
        let request = PhotoRequest::Photo {
            id: "12/../34".to_string(),
        };
        let url = request.upstream_url("https://api.pexels.com/v1/").unwrap();
        assert_eq!(url.as_str(), "https://api.pexels.com/v1/photos/12%2F..%2F34");
    }

    #[tokio::test]
    async fn test_search_without_query_returns_400() {
        let resp = get(state(ProxyConfig::default(), env_with_key()), "/api/pexels?action=search").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["message"], "Query parameter is required for search");
    }

    #[tokio::test]
    async fn test_unknown_action_returns_400() {
        let resp = get(state(ProxyConfig::default(), env_with_key()), "/api/pexels?action=bogus").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(resp).await.get("error").is_some());

        let resp = get(state(ProxyConfig::default(), env_with_key()), "/api/pexels").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_photo_without_id_returns_400() {
        let resp = get(state(ProxyConfig::default(), env_with_key()), "/api/pexels?action=photo").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["message"], "Photo ID is required");
    }

    #[tokio::test]
    async fn test_missing_api_key_returns_configuration_error() {
        let resp = get(
            state(ProxyConfig::default(), ProxyEnv::default()),
            "/api/pexels?action=curated",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "configuration");
        assert!(body["setup"].is_object());
    }

    #[tokio::test]
    async fn test_search_is_forwarded_with_credentials() {
        let base = spawn_upstream(fake_pexels()).await;
        let state = state(config_for(&format!("{base}/v1")), env_with_key());

        let resp = get(state, "/api/pexels?action=search&query=vinyl%20fence&per_page=5&size=").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = json_body(resp).await;
        assert_eq!(body["auth"], "test-key");
        assert_eq!(
            body["params"],
            json!({ "query": "vinyl fence", "page": "1", "per_page": "5" })
        );
    }

    #[tokio::test]
    async fn test_upstream_body_is_passed_through_unchanged() {
        let base = spawn_upstream(fake_pexels()).await;
        let state = state(config_for(&format!("{base}/v1")), env_with_key());

        let resp = get(state, "/api/pexels?action=photo&id=42").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], br#"{"z":1,"id":"42","a":2}"#);
    }

    #[tokio::test]
    async fn test_upstream_failure_returns_500_with_details() {
        let base = spawn_upstream(fake_pexels()).await;
        let state = state(config_for(&format!("{base}/v1")), env_with_key());

        let resp = get(state, "/api/pexels?action=photo&id=404").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "upstream");
        assert_eq!(body["message"], "Failed to fetch from Pexels API");
        assert!(body["details"].as_str().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_returns_500() {
        // Bind then drop a listener so the port is known to be closed
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let state = state(config_for(&format!("http://{addr}/v1")), env_with_key());
        let resp = get(state, "/api/pexels?action=curated").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(resp).await["error"], "upstream");
    }
}
