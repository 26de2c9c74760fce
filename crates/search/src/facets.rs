//! Facet extraction over the full catalog (never the filtered view).

use std::collections::BTreeSet;

use gallery_core::{Facet, Project};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Distinct lowercased platform values, sorted.
pub fn extract_platforms(records: &[Project]) -> BTreeSet<String> {
    records.iter().flat_map(|r| r.platforms.iter()).map(|p| p.to_lowercase()).filter(|p| !p.is_empty()).collect()
}

/// Distinct lowercased tag values, sorted.
pub fn extract_tags(records: &[Project]) -> BTreeSet<String> {
    records.iter().flat_map(|r| r.tags.iter()).map(|t| t.to_lowercase()).filter(|t| !t.is_empty()).collect()
}

/// Platforms with occurrence counts, alphabetical.
pub fn platform_facets(records: &[Project]) -> Vec<Facet> {
    let mut out = count(records.iter().flat_map(|r| r.platforms.iter()));
    out.sort_by(|a, b| a.value.cmp(&b.value));
    out
}

/// Tags ranked by occurrence count descending, ties broken by value ascending.
pub fn rank_tags(records: &[Project]) -> Vec<Facet> {
    let mut out = count(records.iter().flat_map(|r| r.tags.iter()));
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    out
}

fn count<'a>(values: impl Iterator<Item = &'a String>) -> Vec<Facet> {
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for v in values {
        let v = v.to_lowercase();
        if v.is_empty() { continue; }
        *counts.entry(v).or_insert(0) += 1;
    }
    counts.into_iter().map(|(value, count)| Facet::new(value, count)).collect()
}

/// Visible slice of the ranked tag list: the top `top_n` unless expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TagWindow<'a> {
    pub ranked: &'a [Facet],
    pub top_n: usize,
    pub expanded: bool,
}

impl<'a> TagWindow<'a> {
    pub fn new(ranked: &'a [Facet], top_n: usize, expanded: bool) -> Self { Self { ranked, top_n, expanded } }

    pub fn visible(&self) -> &'a [Facet] {
        if self.expanded { self.ranked } else { &self.ranked[..self.top_n.min(self.ranked.len())] }
    }

    /// An expand control is offered only while collapsed and something is hidden.
    pub fn needs_expander(&self) -> bool { !self.expanded && self.ranked.len() > self.top_n }

    pub fn total(&self) -> usize { self.ranked.len() }

    pub fn hidden(&self) -> usize { self.ranked.len() - self.visible().len() }
}

/// Platform and tag facets computed from one catalog snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub platforms: Vec<Facet>,
    pub tags: Vec<Facet>,
}

impl Facets {
    pub fn from_records(records: &[Project]) -> Self {
        Self { platforms: platform_facets(records), tags: rank_tags(records) }
    }

    pub fn tag_window(&self, top_n: usize, expanded: bool) -> TagWindow<'_> { TagWindow::new(&self.tags, top_n, expanded) }

    pub fn is_empty(&self) -> bool { self.platforms.is_empty() && self.tags.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(platforms: &[&str], tags: &[&str]) -> Project {
        Project {
            name: "p".into(),
            platforms: platforms.iter().map(|s| s.to_string()).collect(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn values(f: &[Facet]) -> Vec<&str> { f.iter().map(|f| f.value.as_str()).collect() }

    #[test]
    fn platforms_are_distinct_lowercase_sorted() {
        let records = vec![rec(&["Windows", "Linux"], &[]), rec(&["linux", "Android"], &[]), rec(&[], &[])];
        let set = extract_platforms(&records);
        assert_eq!(set.into_iter().collect::<Vec<_>>(), ["android", "linux", "windows"]);
        let f = platform_facets(&records);
        assert_eq!(values(&f), ["android", "linux", "windows"]);
        assert_eq!(f[1].count, 2);
    }

    #[test]
    fn tags_ranked_by_count_then_name() {
        let records = vec![rec(&[], &["b", "a", "c"]), rec(&[], &["B", "c"]), rec(&[], &["c"])];
        let ranked = rank_tags(&records);
        assert_eq!(values(&ranked), ["c", "b", "a"]);
        assert_eq!(ranked.iter().map(|f| f.count).collect::<Vec<_>>(), [3, 2, 1]);
        assert_eq!(extract_tags(&records).len(), 3);
    }

    #[test]
    fn ties_are_alphabetical() {
        let records = vec![rec(&[], &["zeta", "alpha", "mid"])];
        assert_eq!(values(&rank_tags(&records)), ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn empty_catalog_has_no_facets() {
        let f = Facets::from_records(&[]);
        assert!(f.is_empty());
        let w = f.tag_window(20, false);
        assert!(w.visible().is_empty());
        assert!(!w.needs_expander());
    }

    #[test]
    fn tag_window_truncates_until_expanded() {
        let tags: Vec<String> = (0..25).map(|i| format!("t{:02}", i)).collect();
        let refs: Vec<&str> = tags.iter().map(|s| s.as_str()).collect();
        let f = Facets::from_records(&[rec(&[], &refs)]);
        let w = f.tag_window(20, false);
        assert_eq!(w.visible().len(), 20);
        assert_eq!(w.hidden(), 5);
        assert!(w.needs_expander());
        let open = f.tag_window(20, true);
        assert_eq!(open.visible().len(), 25);
        assert!(!open.needs_expander());
        assert_eq!(open.total(), 25);
    }

    #[test]
    fn exactly_top_n_needs_no_expander() {
        let tags: Vec<String> = (0..20).map(|i| format!("t{:02}", i)).collect();
        let refs: Vec<&str> = tags.iter().map(|s| s.as_str()).collect();
        let f = Facets::from_records(&[rec(&[], &refs)]);
        assert!(!f.tag_window(20, false).needs_expander());
    }
}
