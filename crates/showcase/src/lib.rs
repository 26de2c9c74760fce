//! Gallery showcase: which featured project the hero panel shows, and the timer that advances it.

#![forbid(unsafe_code)]

pub mod rotation;

pub use rotation::{spawn_rotation, Rotation, RotationHandle, Tick, DEFAULT_PERIOD};

/// Cursor over the showcase subset of the catalog.
///
/// The subset itself lives in the catalog; the selector only keeps the index, so
/// every accessor takes the current subset size and never yields an index outside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowcaseSelector {
    index: usize,
}

impl ShowcaseSelector {
    pub fn new() -> Self { Self::default() }

    pub fn index(&self) -> usize { self.index }

    /// Index to display for a subset of `count` items; `None` when there is nothing to show.
    pub fn current(&self, count: usize) -> Option<usize> {
        if count == 0 { None } else { Some(self.index % count) }
    }

    /// Move to the next item, wrapping around. Returns the new index; a no-op for an empty subset.
    pub fn advance(&mut self, count: usize) -> Option<usize> {
        if count == 0 { return None; }
        self.index = (self.index % count + 1) % count;
        metrics::counter!("showcase_advance_total", 1u64);
        Some(self.index)
    }

    /// Jump to `index` (indicator click), wrapped into `[0, count)`.
    pub fn set_index(&mut self, index: usize, count: usize) -> Option<usize> {
        if count == 0 { return None; }
        self.index = index % count;
        Some(self.index)
    }

    pub fn reset(&mut self) { self.index = 0; }
}
