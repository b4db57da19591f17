//! Path and URL conversion utilities.
//!
//! This module handles conversions between:
//! - Slugs (the record identity)
//! - URL paths (the canonical URL at which a location page is served)
//! - Output file paths (where pages are written in the output directory)

use std::path::{Path, PathBuf};

use crate::config::OutputFormat;

/// Convert a slug to its canonical URL path.
///
/// # Examples
/// ```ignore
/// canonical_path("/locations", "turlock") => "/locations/turlock"
/// canonical_path("/locations/", "turlock") => "/locations/turlock"
/// canonical_path("/", "turlock") => "/turlock"
/// ```
pub fn canonical_path(url_prefix: &str, slug: &str) -> String {
    let prefix = url_prefix.trim_end_matches('/');
    format!("{prefix}/{slug}")
}

/// Convert a slug to an output file path.
///
/// Astro pages are `slug.astro` (the file name is the route).
/// HTML pages become `slug/index.html` so the URL needs no extension.
///
/// # Examples
/// ```ignore
/// output_path("turlock", output_dir, Astro) => output_dir/turlock.astro
/// output_path("turlock", output_dir, Html) => output_dir/turlock/index.html
/// ```
pub fn output_path(slug: &str, output_dir: &Path, format: OutputFormat) -> PathBuf {
    match format {
        OutputFormat::Astro => output_dir.join(format!("{slug}.astro")),
        OutputFormat::Html => output_dir.join(slug).join("index.html"),
    }
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolve a config-relative path against the base path.
pub fn resolve_against(base_path: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base_path.join(path)
    } else {
        path.to_path_buf()
    }
}
