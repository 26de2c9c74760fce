use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_TOP_TAGS: usize = 20;
pub const DEFAULT_ROTATE_MS: u64 = 7_000;
pub const DEFAULT_MANIFEST: &str = "data/manifest.json";

/// Runtime knobs shared by frontends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryConfig {
    pub page_size: usize,
    /// Tags shown before the "show all" expander.
    pub top_tags: usize,
    pub rotate_ms: u64,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, top_tags: DEFAULT_TOP_TAGS, rotate_ms: DEFAULT_ROTATE_MS }
    }
}

impl GalleryConfig {
    /// Defaults overridden by `GALLERY_PAGE_SIZE`, `GALLERY_TOP_TAGS` and `GALLERY_ROTATE_MS`.
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(v) = get("GALLERY_PAGE_SIZE").and_then(|s| s.trim().parse::<usize>().ok()).filter(|v| *v > 0) { cfg.page_size = v; }
        if let Some(v) = get("GALLERY_TOP_TAGS").and_then(|s| s.trim().parse::<usize>().ok()) { cfg.top_tags = v; }
        if let Some(v) = get("GALLERY_ROTATE_MS").and_then(|s| s.trim().parse::<u64>().ok()).filter(|v| *v > 0) { cfg.rotate_ms = v; }
        cfg
    }

    pub fn rotate_period(&self) -> Duration { Duration::from_millis(self.rotate_ms) }
}
