//! Query pipeline: platform → tags → search → stable sort → page window.

use std::ops::Range;
use std::time::Instant;

use gallery_core::{Project, QueryState, SortKey};
use serde::Serialize;
use tracing::trace;

/// One page of the filtered, sorted result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult<'a> {
    pub page: Vec<&'a Project>,
    /// Matches before pagination.
    pub total_matches: usize,
}

impl QueryResult<'_> {
    pub fn is_empty(&self) -> bool { self.total_matches == 0 }
}

/// Record counts surviving each filter stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueryDebugInfo {
    pub total: usize,
    pub after_platform: usize,
    pub after_tags: usize,
    pub after_search: usize,
}

/// Evaluate `state` against `records`. Total and pure: never fails, never mutates input.
pub fn evaluate<'a>(records: &'a [Project], state: &QueryState, page_size: usize) -> QueryResult<'a> {
    evaluate_with_debug(records, state, page_size).0
}

pub fn evaluate_with_debug<'a>(
    records: &'a [Project],
    state: &QueryState,
    page_size: usize,
) -> (QueryResult<'a>, QueryDebugInfo) {
    let started = Instant::now();
    let platform = state.platform.as_deref().map(str::to_lowercase).filter(|p| !p.is_empty());
    let tags: Vec<String> = state.tags.iter().map(|t| t.to_lowercase()).collect();
    let term = state.search.to_lowercase();

    let mut hits: Vec<&Project> = match platform.as_deref() {
        Some(p) => records.iter().filter(|r| r.has_platform(p)).collect(),
        None => records.iter().collect(),
    };
    let after_platform = hits.len();

    if !tags.is_empty() {
        hits.retain(|r| tags_match(r, &tags));
    }
    let after_tags = hits.len();

    if !term.is_empty() {
        hits.retain(|r| search_matches(r, &term));
    }
    let after_search = hits.len();

    // Keys are extracted once per record; sort_by is stable and the direction is
    // applied to the comparison so ties keep input order either way.
    let mut keyed: Vec<(SortValue, &Project)> = hits.into_iter().map(|r| (SortValue::of(r, state.sort), r)).collect();
    keyed.sort_by(|(a, _), (b, _)| state.direction.apply(a.cmp(b)));

    let total_matches = keyed.len();
    let page = match page_range(state.page, page_size, total_matches) {
        Some(range) => keyed[range].iter().map(|(_, r)| *r).collect(),
        None => Vec::new(),
    };

    let dbg = QueryDebugInfo { total: records.len(), after_platform, after_tags, after_search };
    trace!(?dbg, page = state.page, returned = page.len(), "query evaluated");
    metrics::histogram!("query_eval_ms", started.elapsed().as_secs_f64() * 1_000.0);
    metrics::histogram!("query_matches", total_matches as f64);
    (QueryResult { page, total_matches }, dbg)
}

/// Half-open index window `[(page-1)*size, page*size)` clipped to `len`.
/// `None` for page 0, size 0, or a window starting past the end.
pub fn page_range(page: usize, page_size: usize, len: usize) -> Option<Range<usize>> {
    if page == 0 || page_size == 0 { return None; }
    let start = (page - 1).checked_mul(page_size)?;
    if start >= len { return None; }
    let end = start.saturating_add(page_size).min(len);
    Some(start..end)
}

fn tags_match(record: &Project, wanted: &[String]) -> bool { wanted.iter().all(|w| record.has_tag(w)) }

fn search_matches(record: &Project, term: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(term);
    hit(&record.name)
        || hit(&record.description)
        || record.author.as_deref().map(hit).unwrap_or(false)
        || record.language.as_deref().map(hit).unwrap_or(false)
        || record.platforms.iter().any(|p| hit(p))
        || record.tags.iter().any(|t| hit(t))
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Int(i64),
    Text(String),
}

impl SortValue {
    fn of(record: &Project, key: SortKey) -> Self {
        match key {
            SortKey::Stars => SortValue::Int(i64::try_from(record.stars_or_zero()).unwrap_or(i64::MAX)),
            SortKey::LastUpdated => SortValue::Int(record.updated_at()),
            SortKey::Author => SortValue::Text(record.author.as_deref().unwrap_or("").to_lowercase()),
            SortKey::Name => SortValue::Text(record.name.to_lowercase()),
        }
    }
}

/// Page navigation derived from a result; pagination is hidden for a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total_matches: usize,
    pub page_count: usize,
}

impl Pagination {
    pub fn new(page: usize, page_size: usize, total_matches: usize) -> Self {
        let page_count = if page_size == 0 { 0 } else { total_matches.div_ceil(page_size) };
        Self { page, page_size, total_matches, page_count }
    }

    pub fn has_prev(&self) -> bool { self.page > 1 }
    pub fn has_next(&self) -> bool { self.page < self.page_count }
    pub fn is_visible(&self) -> bool { self.page_count > 1 }
}
