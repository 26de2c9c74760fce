//! Query state and the reducer that replaces UI callback chains.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseKeyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    Stars,
    Author,
    #[default]
    LastUpdated,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::LastUpdated, SortKey::Name, SortKey::Stars, SortKey::Author];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Stars => "stars",
            SortKey::Author => "author",
            SortKey::LastUpdated => "lastUpdated",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for SortKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseKeyError {
                what: "sort key",
                value: s.to_string(),
                expected: "name, stars, author, lastUpdated",
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Orient an ascending comparison. Equal stays equal, so stable sorts keep ties in input order.
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for SortDirection {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ParseKeyError { what: "sort direction", value: s.to_string(), expected: "asc, desc" }),
        }
    }
}

/// Snapshot of the user's filter, search, sort and page selection.
///
/// Values are normalized on the way in (lowercased platform/tags, trimmed and
/// lowercased search) so the engine can compare without re-normalizing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    pub platform: Option<String>,
    pub tags: BTreeSet<String>,
    pub search: String,
    pub sort: SortKey,
    pub direction: SortDirection,
    /// 1-based.
    pub page: usize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            platform: None,
            tags: BTreeSet::new(),
            search: String::new(),
            sort: SortKey::default(),
            direction: SortDirection::default(),
            page: 1,
        }
    }
}

/// Discrete user interactions. Everything except `SetPage` resets the page to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Select a platform, or deselect it when it is already active.
    TogglePlatform(String),
    ToggleTag(String),
    /// Tag badge on a result card: add the tag and drop the search term.
    AddTag(String),
    ClearFilters,
    SetSearch(String),
    ClearSearch,
    SetSort(SortKey),
    SetDirection(SortDirection),
    SetPage(usize),
}

impl QueryState {
    pub fn has_filters(&self) -> bool { self.platform.is_some() || !self.tags.is_empty() }

    pub fn is_default(&self) -> bool { *self == QueryState::default() }

    /// Reducer: `(state, action) -> state'`.
    pub fn apply(mut self, action: Action) -> Self {
        match action {
            Action::TogglePlatform(p) => {
                let p = p.trim().to_lowercase();
                if self.platform.as_deref() == Some(p.as_str()) || p.is_empty() {
                    self.platform = None;
                } else {
                    self.platform = Some(p);
                }
            }
            Action::ToggleTag(t) => {
                let t = t.trim().to_lowercase();
                if !self.tags.remove(&t) && !t.is_empty() {
                    self.tags.insert(t);
                }
            }
            Action::AddTag(t) => {
                let t = t.trim().to_lowercase();
                if !t.is_empty() { self.tags.insert(t); }
                self.search.clear();
            }
            Action::ClearFilters => {
                self.platform = None;
                self.tags.clear();
            }
            Action::SetSearch(term) => self.search = normalize_search(&term),
            Action::ClearSearch => self.search.clear(),
            Action::SetSort(key) => self.sort = key,
            Action::SetDirection(dir) => self.direction = dir,
            Action::SetPage(page) => {
                self.page = page;
                return self;
            }
        }
        self.page = 1;
        self
    }
}

pub(crate) fn normalize_search(term: &str) -> String { term.trim().to_lowercase() }
