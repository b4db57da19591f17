//! Configuration type definitions.
//!
//! This module contains all the data structures used in fencesite configuration files.
//! These types are pure data - no I/O or complex logic.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Root config
// =============================================================================

/// Root configuration, loaded from `fencesite.yaml` and the environment.
///
/// Every section has defaults, so an empty file (or no file at all)
/// produces the production configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub business: BusinessInfo,
    /// Path to a YAML dataset replacing the embedded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

// =============================================================================
// Site configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Directory the location pages are written to
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Document flavor written for each record
    #[serde(default)]
    pub format: OutputFormat,
    /// Path prefix of the canonical page URL ("/locations" -> /locations/<slug>)
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    /// Directory whose `templates/` replace the built-in templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<PathBuf>,
}

fn default_output() -> PathBuf {
    PathBuf::from("src/pages/locations")
}

fn default_url_prefix() -> String {
    "/locations".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            url_prefix: default_url_prefix(),
            theme: None,
        }
    }
}

/// The kind of document emitted per location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// An Astro page wrapping the body in the site `Layout` component
    #[default]
    Astro,
    /// A standalone HTML5 document
    Html,
}

impl OutputFormat {
    /// Name of the page template that wraps the shared sections.
    pub fn page_template(self) -> &'static str {
        match self {
            OutputFormat::Astro => "page_astro.html",
            OutputFormat::Html => "page_html.html",
        }
    }
}

// =============================================================================
// Business information
// =============================================================================

/// Business facts that are identical on every generated page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessInfo {
    pub name: String,
    /// Site origin, without a trailing slash
    pub url: String,
    /// Telephone in schema.org form ("+1-888-682-0507")
    pub telephone: String,
    /// Telephone as used in `tel:` links
    pub phone_dial: String,
    /// Telephone as shown to visitors
    pub phone_display: String,
    pub region: String,
    pub country: String,
    pub opening_hours: String,
    /// Radius of the service area around each location, in meters
    pub service_radius_m: u32,
}

impl Default for BusinessInfo {
    fn default() -> Self {
        Self {
            name: "Sacramento Fencing Co.".to_string(),
            url: "https://sacramento-fencing.co".to_string(),
            telephone: "+1-888-682-0507".to_string(),
            phone_dial: "888-682-0507".to_string(),
            phone_display: "(888) 682-0507".to_string(),
            region: "CA".to_string(),
            country: "US".to_string(),
            opening_hours: "Mo-Fr 07:00-18:00, Sa 08:00-16:00".to_string(),
            service_radius_m: 25000,
        }
    }
}

// =============================================================================
// Proxy configuration
// =============================================================================

/// Upstream endpoints for the API proxies. Credentials are read from the
/// environment, never from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_pexels_base_url")]
    pub pexels_base_url: String,
    #[serde(default = "default_search_console_base_url")]
    pub search_console_base_url: String,
    /// Maximum rows requested from the search analytics API
    #[serde(default = "default_row_limit")]
    pub row_limit: u32,
}

fn default_pexels_base_url() -> String {
    "https://api.pexels.com/v1".to_string()
}

fn default_search_console_base_url() -> String {
    "https://www.googleapis.com/webmasters/v3".to_string()
}

fn default_row_limit() -> u32 {
    1000
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            pexels_base_url: default_pexels_base_url(),
            search_console_base_url: default_search_console_base_url(),
            row_limit: default_row_limit(),
        }
    }
}
