//! Gallery core types: project records, catalog snapshots, facets and query state.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub mod config;
pub mod error;
pub mod params;
pub mod query;

pub use config::GalleryConfig;
pub use error::{LoadError, ParseKeyError};
pub use query::{Action, QueryState, SortDirection, SortKey};

/// A single catalog entry as it appears in the JSON data files.
///
/// Optional fields stay optional; sort keys substitute their documented
/// defaults (`stars` → 0, `lastUpdated` → epoch) at comparison time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Display and list key. Not guaranteed unique.
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub platforms: SmallVec<[String; 4]>,
    /// Older data files call these `categories`.
    #[serde(default, alias = "categories")]
    pub tags: SmallVec<[String; 8]>,
    #[serde(default)]
    pub is_showcase: bool,
}

impl Project {
    pub fn stars_or_zero(&self) -> u64 { self.stars.unwrap_or(0) }

    /// Milliseconds since epoch for `lastUpdated`; missing or unparseable values map to 0.
    pub fn updated_at(&self) -> i64 {
        self.last_updated.as_deref().and_then(parse_timestamp).unwrap_or(0)
    }

    pub fn has_platform(&self, lowered: &str) -> bool {
        self.platforms.iter().any(|p| p.to_lowercase() == lowered)
    }

    pub fn has_tag(&self, lowered: &str) -> bool {
        self.tags.iter().any(|t| t.to_lowercase() == lowered)
    }
}

/// Parse the date-like strings found in data files (RFC 3339, naive datetimes, plain dates).
/// Naive values are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() { return None; }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// One published load cycle. `generation` grows by one per successful publish.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Catalog {
    pub generation: u64,
    pub projects: Vec<Project>,
}

impl Catalog {
    pub fn len(&self) -> usize { self.projects.len() }
    pub fn is_empty(&self) -> bool { self.projects.is_empty() }

    /// Records flagged for the hero panel, in store order.
    pub fn showcase(&self) -> Vec<&Project> {
        self.projects.iter().filter(|p| p.is_showcase).collect()
    }
}

/// A facet value (lowercased) with its occurrence count across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Facet {
    pub value: String,
    pub count: usize,
}

impl Facet {
    pub fn new(value: impl Into<String>, count: usize) -> Self {
        Self { value: value.into(), count }
    }
}
