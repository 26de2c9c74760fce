//! Gallery store: loads project records and publishes immutable catalog snapshots.

#![forbid(unsafe_code)]

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use gallery_core::{Catalog, LoadError, Project};
use tokio::sync::watch;
use tracing::{debug, info};

pub mod fetch;
pub mod loader;

pub use fetch::{Fetch, FsFetcher, MemoryFetcher};
pub use loader::{load, LoadReport, Source, SourceFailure};

/// Identifies one load cycle. Only the most recently issued ticket may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// What a reload did with its records.
#[derive(Debug)]
pub struct ReloadOutcome {
    /// Generation installed, or `None` when a newer load superseded this one.
    pub generation: Option<u64>,
    pub records: usize,
    pub files: usize,
    pub failures: Vec<SourceFailure>,
}

/// Holds the current catalog snapshot and serializes publication of load results.
///
/// Readers get a cheap `Arc<Catalog>`; the snapshot is never mutated, only replaced.
pub struct CatalogStore {
    snap: ArcSwap<Catalog>,
    latest_ticket: Mutex<u64>,
    generation_tx: watch::Sender<u64>,
    generation_rx: watch::Receiver<u64>,
}

impl Default for CatalogStore {
    fn default() -> Self { Self::new() }
}

impl CatalogStore {
    pub fn new() -> Self {
        let (generation_tx, generation_rx) = watch::channel(0u64);
        Self {
            snap: ArcSwap::from_pointee(Catalog::default()),
            latest_ticket: Mutex::new(0),
            generation_tx,
            generation_rx,
        }
    }

    pub fn current(&self) -> Arc<Catalog> { self.snap.load_full() }

    pub fn generation(&self) -> u64 { self.snap.load().generation }

    pub fn subscribe_generation(&self) -> watch::Receiver<u64> { self.generation_rx.clone() }

    /// Start a load cycle. Any ticket issued earlier becomes stale.
    pub fn begin_load(&self) -> LoadTicket {
        let mut latest = self.latest_ticket.lock().unwrap_or_else(|e| e.into_inner());
        *latest += 1;
        LoadTicket(*latest)
    }

    /// Install `projects` as the next generation if `ticket` is still the newest.
    /// Returns the installed generation, or `None` for a superseded load.
    pub fn publish(&self, ticket: LoadTicket, projects: Vec<Project>) -> Option<u64> {
        let latest = self.latest_ticket.lock().unwrap_or_else(|e| e.into_inner());
        if ticket.0 != *latest {
            debug!(ticket = ticket.0, latest = *latest, "discarding superseded load");
            return None;
        }
        let generation = self.snap.load().generation + 1;
        let records = projects.len();
        self.snap.store(Arc::new(Catalog { generation, projects }));
        drop(latest);
        metrics::gauge!("catalog_records", records as f64);
        let _ = self.generation_tx.send(generation);
        info!(generation, records, "catalog published");
        Some(generation)
    }

    /// Load `sources` and publish the result. On a manifest failure the current
    /// snapshot is left untouched and the error is returned.
    pub async fn reload<F: Fetch + ?Sized>(&self, fetcher: &F, sources: &[Source]) -> Result<ReloadOutcome, LoadError> {
        let ticket = self.begin_load();
        let report = loader::load(fetcher, sources).await?;
        let records = report.projects.len();
        let generation = self.publish(ticket, report.projects);
        Ok(ReloadOutcome { generation, records, files: report.files, failures: report.failures })
    }
}
