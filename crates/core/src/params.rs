//! URL query-string codec for [`QueryState`].
//!
//! Keys: `platform`, `category`/`tag` (repeatable), `search`, `sort`,
//! `direction`, `page`. Absent keys keep defaults; unknown values fall back to
//! defaults with a warning rather than failing, since links are user-editable.

use tracing::warn;
use url::form_urlencoded;

use crate::query::{normalize_search, QueryState, SortDirection, SortKey};

impl QueryState {
    pub fn from_query_string(qs: &str) -> Self {
        let qs = qs.trim().trim_start_matches('?');
        let mut state = QueryState::default();
        for (key, value) in form_urlencoded::parse(qs.as_bytes()) {
            match key.as_ref() {
                "platform" => {
                    // State holds a single platform; the first occurrence wins.
                    let v = value.trim().to_lowercase();
                    if state.platform.is_none() && !v.is_empty() { state.platform = Some(v); }
                }
                "category" | "tag" => {
                    let v = value.trim().to_lowercase();
                    if !v.is_empty() { state.tags.insert(v); }
                }
                "search" => state.search = normalize_search(&value),
                "sort" => match value.parse::<SortKey>() {
                    Ok(k) => state.sort = k,
                    Err(e) => warn!(error = %e, "ignoring sort parameter"),
                },
                "direction" => match value.parse::<SortDirection>() {
                    Ok(d) => state.direction = d,
                    Err(e) => warn!(error = %e, "ignoring direction parameter"),
                },
                "page" => match value.trim().parse::<usize>() {
                    Ok(p) if p >= 1 => state.page = p,
                    _ => warn!(value = %value, "ignoring page parameter"),
                },
                _ => {}
            }
        }
        state
    }

    /// Encode the state the way the filter panel writes it back to the URL:
    /// sort and direction are always present, the page only when past the first.
    pub fn to_query_string(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        if let Some(p) = &self.platform { ser.append_pair("platform", p); }
        for t in &self.tags { ser.append_pair("category", t); }
        if !self.search.is_empty() { ser.append_pair("search", &self.search); }
        ser.append_pair("sort", self.sort.as_str());
        ser.append_pair("direction", self.direction.as_str());
        if self.page > 1 { ser.append_pair("page", &self.page.to_string()); }
        ser.finish()
    }
}
