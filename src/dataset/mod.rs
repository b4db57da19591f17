//! The location dataset: one record per served city.
//!
//! Records are loaded whole (from the embedded payload or a YAML file) and
//! validated as a set before any page is rendered.

mod validate;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use validate::ValidationIssue;

/// The dataset compiled into the binary.
const BUILTIN_LOCATIONS: &str = include_str!("../../data/locations.yaml");

#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("failed to read dataset {0}: {1}")]
    Io(std::path::PathBuf, std::io::Error),

    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid dataset ({} issue(s)):\n{}", .0.len(), format_issues(.0))]
    Invalid(Vec<ValidationIssue>),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One city's data, driving a single generated page. Identity is `slug`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    pub slug: String,
    pub lat: f64,
    pub lng: f64,
    pub zip: String,
    pub tagline: String,
    pub unique: String,
    pub neighborhoods: Vec<String>,
    pub employers: Vec<String>,
    pub population: String,
}

/// A validated, ordered collection of location records.
///
/// Slugs are unique, so each record maps to its own output file.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<LocationRecord>,
}

impl Dataset {
    /// Build a dataset, rejecting it if any record breaks the data model.
    ///
    /// Every issue is reported, not just the first.
    pub fn new(records: Vec<LocationRecord>) -> Result<Self, DatasetError> {
        let mut issues = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            issues.extend(validate::check_record(index, record));

            if let Some(first) = seen.insert(record.slug.as_str(), index) {
                issues.push(ValidationIssue::DuplicateSlug {
                    slug: record.slug.clone(),
                    first,
                    second: index,
                });
            }
        }

        if !issues.is_empty() {
            return Err(DatasetError::Invalid(issues));
        }

        Ok(Self { records })
    }

    /// The dataset embedded in the binary.
    pub fn builtin() -> Result<Self, DatasetError> {
        Self::from_yaml(BUILTIN_LOCATIONS)
    }

    /// Parse and validate a YAML list of records.
    pub fn from_yaml(yaml: &str) -> Result<Self, DatasetError> {
        let records: Vec<LocationRecord> = serde_yaml::from_str(yaml)?;
        Self::new(records)
    }

    /// Load a dataset file.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DatasetError::Io(path.to_path_buf(), e))?;
        Self::from_yaml(&content)
    }

    /// Load from `path` if given, otherwise use the embedded dataset.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, DatasetError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[cfg(test)]
    pub fn get(&self, slug: &str) -> Option<&LocationRecord> {
        self.records.iter().find(|record| record.slug == slug)
    }
}
