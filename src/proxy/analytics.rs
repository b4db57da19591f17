//! Search-analytics proxy (`GET /api/gsc`).
//!
//! Authenticates as a service account, queries the Search Console
//! analytics endpoint and reduces the rows to dashboard metrics.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use chrono::{NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;
use url::form_urlencoded::byte_serialize;

use super::error::{ErrorResponse, ProxyError};
use super::google_auth::{SEARCH_CONSOLE_SCOPE, ServiceAccount};
use super::{AppState, ProxyEnv};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_DIMENSION: &str = "query";
const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Raw query parameters. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub dimension: Option<String>,
}

/// A validated analytics request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dimension: String,
}

/// The trailing window ending at `today`.
pub fn default_date_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - TimeDelta::days(DEFAULT_WINDOW_DAYS), today)
}

fn parse_date(name: &str, value: &str) -> Result<NaiveDate, ErrorResponse> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        ErrorResponse::bad_request(format!("{name} must be a date in YYYY-MM-DD format"))
            .with_details(json!(value))
    })
}

impl AnalyticsRequest {
    pub fn from_query(query: AnalyticsQuery, today: NaiveDate) -> Result<Self, ErrorResponse> {
        let (default_start, default_end) = default_date_range(today);

        let start_date = match query.start_date.filter(|v| !v.is_empty()) {
            Some(value) => parse_date("startDate", &value)?,
            None => default_start,
        };
        let end_date = match query.end_date.filter(|v| !v.is_empty()) {
            Some(value) => parse_date("endDate", &value)?,
            None => default_end,
        };

        Ok(Self {
            start_date,
            end_date,
            dimension: query
                .dimension
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_DIMENSION.to_string()),
        })
    }
}

/// Remediation steps attached to configuration and upstream failures.
pub fn setup_steps() -> Value {
    json!({
        "step1": "Create a Google Cloud Project",
        "step2": "Enable Google Search Console API",
        "step3": "Create Service Account and download JSON key",
        "step4": "Add service account email to GSC property",
        "step5": "Set GOOGLE_SERVICE_ACCOUNT_JSON in the server environment",
        "step6": "Set GSC_SITE_URL in the server environment (e.g., sc-domain:example.com)",
    })
}

fn missing_credentials() -> ErrorResponse {
    ErrorResponse::configuration("Missing Google Service Account credentials")
        .with_setup(setup_steps())
}

/// Resolve the service account and site, before any network call.
fn credentials(env: &ProxyEnv) -> Result<(ServiceAccount, &str), ErrorResponse> {
    let json = env
        .service_account_json
        .as_deref()
        .ok_or_else(missing_credentials)?;

    let account = ServiceAccount::from_json(json)
        .map_err(|e| missing_credentials().with_details(json!(e.to_string())))?;

    let site = env.site_url.as_deref().ok_or_else(|| {
        ErrorResponse::configuration("Missing Search Console site (GSC_SITE_URL)")
            .with_setup(setup_steps())
    })?;

    Ok((account, site))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchAnalyticsBody<'a> {
    start_date: String,
    end_date: String,
    dimensions: [&'a str; 1],
    row_limit: u32,
    data_state: &'static str,
}

/// One row of the upstream response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsRow {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

#[derive(Debug, Default, Deserialize)]
struct SearchAnalyticsResponse {
    #[serde(default)]
    rows: Vec<AnalyticsRow>,
}

/// The analytics endpoint for `site` under `base_url`.
fn query_url(base_url: &str, site: &str) -> Result<Url, ProxyError> {
    let mut url = Url::parse(base_url)?;
    if url.cannot_be_a_base() {
        return Err(ProxyError::BaseUrl(base_url.to_string()));
    }
    let site: String = byte_serialize(site.as_bytes()).collect();
    let path = format!(
        "{}/sites/{site}/searchAnalytics/query",
        url.path().trim_end_matches('/')
    );
    url.set_path(&path);
    Ok(url)
}

/// Run one search-analytics query with a bearer token.
pub async fn query_search_analytics(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    site: &str,
    request: &AnalyticsRequest,
    row_limit: u32,
) -> Result<Vec<AnalyticsRow>, ProxyError> {
    let body = SearchAnalyticsBody {
        start_date: request.start_date.format(DATE_FORMAT).to_string(),
        end_date: request.end_date.format(DATE_FORMAT).to_string(),
        dimensions: [request.dimension.as_str()],
        row_limit,
        data_state: "all",
    };

    let response = client
        .post(query_url(base_url, site)?)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ProxyError::from_response(response).await);
    }

    let parsed: SearchAnalyticsResponse = serde_json::from_slice(&response.bytes().await?)?;
    Ok(parsed.rows)
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_clicks: u64,
    pub total_impressions: u64,
    pub avg_position: String,
    #[serde(rename = "avgCTR")]
    pub avg_ctr: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Keyword {
    pub keyword: String,
    pub clicks: u64,
    pub impressions: u64,
    /// Click-through rate as a percentage, two decimals
    pub ctr: String,
    /// Average position, one decimal
    pub position: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub success: bool,
    pub date_range: DateRange,
    pub metrics: Metrics,
    pub keywords: Vec<Keyword>,
}

fn count(value: f64) -> u64 {
    value.max(0.0).round() as u64
}

/// Reduce upstream rows to aggregate metrics and per-keyword entries.
pub fn summarize(rows: &[AnalyticsRow]) -> (Metrics, Vec<Keyword>) {
    let keywords = rows
        .iter()
        .map(|row| Keyword {
            keyword: row.keys.first().cloned().unwrap_or_default(),
            clicks: count(row.clicks),
            impressions: count(row.impressions),
            ctr: format!("{:.2}", row.ctr * 100.0),
            position: format!("{:.1}", row.position),
        })
        .collect();

    let n = rows.len() as f64;
    let (avg_position, avg_ctr) = if rows.is_empty() {
        (0.0, 0.0)
    } else {
        (
            rows.iter().map(|r| r.position).sum::<f64>() / n,
            rows.iter().map(|r| r.ctr).sum::<f64>() / n * 100.0,
        )
    };

    let metrics = Metrics {
        total_clicks: count(rows.iter().map(|r| r.clicks).sum()),
        total_impressions: count(rows.iter().map(|r| r.impressions).sum()),
        avg_position: format!("{avg_position:.1}"),
        avg_ctr: format!("{avg_ctr:.2}"),
    };

    (metrics, keywords)
}

async fn fetch_report(
    state: &AppState,
    account: &ServiceAccount,
    site: &str,
    request: &AnalyticsRequest,
) -> Result<AnalyticsResponse, ProxyError> {
    debug!(
        client_email = account.client_email(),
        token_uri = account.token_uri(),
        site,
        dimension = %request.dimension,
        "querying search analytics"
    );
    let token = account
        .access_token(&state.http, SEARCH_CONSOLE_SCOPE)
        .await?;
    let rows = query_search_analytics(
        &state.http,
        &state.config.search_console_base_url,
        &token,
        site,
        request,
        state.config.row_limit,
    )
    .await?;

    let (metrics, keywords) = summarize(&rows);
    Ok(AnalyticsResponse {
        success: true,
        date_range: DateRange {
            start_date: request.start_date.format(DATE_FORMAT).to_string(),
            end_date: request.end_date.format(DATE_FORMAT).to_string(),
        },
        metrics,
        keywords,
    })
}

pub async fn handle(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, ErrorResponse> {
    let request = AnalyticsRequest::from_query(query, Utc::now().date_naive())?;
    let (account, site) = credentials(&state.env)?;

    let report = fetch_report(&state, &account, site, &request)
        .await
        .map_err(|e| {
            warn!(error = %e, "search analytics request failed");
            ErrorResponse::upstream("Failed to fetch Google Search Console data")
                .with_details(json!(e.to_string()))
                .with_setup(setup_steps())
        })?;

    Ok(Json(report))
}
