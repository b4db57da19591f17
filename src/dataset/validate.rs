//! Per-record checks against the location data model.

use std::fmt;

use super::LocationRecord;

/// A single way in which a dataset breaks the data model.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    /// A required text field (or list) is empty
    Empty { index: usize, field: &'static str },
    /// A neighborhood or employer entry is blank
    EmptyEntry {
        index: usize,
        field: &'static str,
        position: usize,
    },
    /// The slug is not usable as a file name and URL segment
    UnsafeSlug { index: usize, slug: String },
    /// The zip code is not five ASCII digits
    BadZip { index: usize, zip: String },
    /// Latitude or longitude outside the WGS84 range
    BadCoordinate { index: usize, lat: f64, lng: f64 },
    /// Two records share a slug and would overwrite each other's output
    DuplicateSlug {
        slug: String,
        first: usize,
        second: usize,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Empty { index, field } => {
                write!(f, "record {index}: '{field}' must not be empty")
            }
            ValidationIssue::EmptyEntry {
                index,
                field,
                position,
            } => write!(f, "record {index}: '{field}[{position}]' must not be blank"),
            ValidationIssue::UnsafeSlug { index, slug } => write!(
                f,
                "record {index}: slug '{slug}' must be lowercase letters, digits and single dashes"
            ),
            ValidationIssue::BadZip { index, zip } => {
                write!(f, "record {index}: zip '{zip}' must be exactly 5 digits")
            }
            ValidationIssue::BadCoordinate { index, lat, lng } => {
                write!(f, "record {index}: ({lat}, {lng}) is not a valid coordinate")
            }
            ValidationIssue::DuplicateSlug {
                slug,
                first,
                second,
            } => write!(
                f,
                "records {first} and {second}: duplicate slug '{slug}'"
            ),
        }
    }
}

/// Check one record in isolation. Cross-record checks (slug uniqueness)
/// happen in [`super::Dataset::new`].
pub(super) fn check_record(index: usize, record: &LocationRecord) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let text_fields = [
        ("name", &record.name),
        ("slug", &record.slug),
        ("zip", &record.zip),
        ("tagline", &record.tagline),
        ("unique", &record.unique),
        ("population", &record.population),
    ];
    for (field, value) in text_fields {
        if value.trim().is_empty() {
            issues.push(ValidationIssue::Empty { index, field });
        }
    }

    if !record.slug.is_empty() && !is_url_safe_slug(&record.slug) {
        issues.push(ValidationIssue::UnsafeSlug {
            index,
            slug: record.slug.clone(),
        });
    }

    if !record.zip.is_empty() && !is_zip(&record.zip) {
        issues.push(ValidationIssue::BadZip {
            index,
            zip: record.zip.clone(),
        });
    }

    if !(-90.0..=90.0).contains(&record.lat) || !(-180.0..=180.0).contains(&record.lng) {
        issues.push(ValidationIssue::BadCoordinate {
            index,
            lat: record.lat,
            lng: record.lng,
        });
    }

    for (field, entries) in [
        ("neighborhoods", &record.neighborhoods),
        ("employers", &record.employers),
    ] {
        if entries.is_empty() {
            issues.push(ValidationIssue::Empty { index, field });
        }
        for (position, entry) in entries.iter().enumerate() {
            if entry.trim().is_empty() {
                issues.push(ValidationIssue::EmptyEntry {
                    index,
                    field,
                    position,
                });
            }
        }
    }

    issues
}

/// `[a-z0-9]` groups joined by single dashes.
fn is_url_safe_slug(slug: &str) -> bool {
    slug.split('-').all(|part| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    })
}

fn is_zip(zip: &str) -> bool {
    zip.len() == 5 && zip.chars().all(|c| c.is_ascii_digit())
}
