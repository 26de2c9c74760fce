//! Gallery search: filter, sort and paginate project records; derive facets.
//! Every evaluation runs the full pipeline from scratch over the catalog slice.

#![forbid(unsafe_code)]

pub mod engine;
pub mod facets;

pub use engine::{evaluate, evaluate_with_debug, page_range, Pagination, QueryDebugInfo, QueryResult};
pub use facets::{extract_platforms, extract_tags, platform_facets, rank_tags, Facets, TagWindow};
