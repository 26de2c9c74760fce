//! Gallery session façade.
//!
//! Frontends (the CLI today) hold one [`Session`]: it owns the query state,
//! feeds user actions through the reducer, re-runs the engine against the
//! current catalog snapshot and hands back a [`View`].

#![forbid(unsafe_code)]

use std::sync::Arc;

use gallery_core::{Action, Catalog, GalleryConfig, LoadError, Project, QueryState};
use gallery_search::{evaluate, Facets, Pagination, TagWindow};
use gallery_showcase::{Rotation, ShowcaseSelector, Tick};
use gallery_store::{CatalogStore, Fetch, ReloadOutcome, Source};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Why a view has no projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EmptyState {
    /// The catalog itself is empty (nothing loaded, or every source failed).
    NoData,
    /// Records exist but none match the active filters.
    NoMatches,
}

/// Everything a frontend needs to render the result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub projects: Vec<Project>,
    pub total_matches: usize,
    pub pagination: Pagination,
    pub state: QueryState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty: Option<EmptyState>,
}

/// The hero panel's current record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowcaseView {
    pub index: usize,
    pub count: usize,
    pub project: Project,
}

pub struct Session {
    store: Arc<CatalogStore>,
    fetcher: Arc<dyn Fetch>,
    sources: Vec<Source>,
    config: GalleryConfig,
    state: QueryState,
    facets: Facets,
    facets_generation: Option<u64>,
    tags_expanded: bool,
    showcase: ShowcaseSelector,
    rotation: Rotation,
    /// Set by `start_rotation`, cleared by `stop_rotation`; loads honour it.
    rotation_wanted: bool,
    ticks: Option<mpsc::Receiver<Tick>>,
}

impl Session {
    pub fn new(fetcher: Arc<dyn Fetch>, sources: Vec<Source>, config: GalleryConfig) -> Self {
        Self::with_store(Arc::new(CatalogStore::new()), fetcher, sources, config)
    }

    /// Session over an existing store, e.g. one shared with another reader.
    pub fn with_store(store: Arc<CatalogStore>, fetcher: Arc<dyn Fetch>, sources: Vec<Source>, config: GalleryConfig) -> Self {
        let mut s = Self {
            store,
            fetcher,
            sources,
            config,
            state: QueryState::default(),
            facets: Facets::default(),
            facets_generation: None,
            tags_expanded: false,
            showcase: ShowcaseSelector::new(),
            rotation: Rotation::new(),
            rotation_wanted: false,
            ticks: None,
        };
        s.refresh();
        s
    }

    /// Load all sources and publish a new catalog generation.
    ///
    /// When the load publishes, facets are recomputed, the showcase returns to
    /// its first record, the tag list collapses and, if rotation was requested,
    /// it restarts for the new showcase subset. A superseded load leaves the
    /// session as it was. On failure the previous catalog stays in place.
    pub async fn load(&mut self) -> Result<ReloadOutcome, LoadError> {
        let outcome = match self.store.reload(&*self.fetcher, &self.sources).await {
            Ok(o) => o,
            Err(e) => {
                warn!(error = %e, phase = e.phase(), "session load failed; keeping previous catalog");
                return Err(e);
            }
        };
        if outcome.generation.is_some() {
            self.refresh();
            self.showcase.reset();
            self.tags_expanded = false;
            if self.rotation_wanted { self.start_rotation(); }
        } else {
            debug!("load superseded; session state untouched");
        }
        info!(generation = ?outcome.generation, records = outcome.records, failures = outcome.failures.len(), "session loaded");
        Ok(outcome)
    }

    /// Recompute cached facets if the store published a new generation.
    pub fn refresh(&mut self) -> bool {
        let catalog = self.store.current();
        if self.facets_generation == Some(catalog.generation) { return false; }
        self.facets = Facets::from_records(&catalog.projects);
        self.facets_generation = Some(catalog.generation);
        debug!(generation = catalog.generation, platforms = self.facets.platforms.len(), tags = self.facets.tags.len(), "facets recomputed");
        true
    }

    /// Apply one user action and return the resulting view.
    pub fn dispatch(&mut self, action: Action) -> View {
        metrics::counter!("session_actions_total", 1u64, "action" => action_name(&action));
        if matches!(action, Action::ClearFilters) { self.tags_expanded = false; }
        self.state = std::mem::take(&mut self.state).apply(action);
        self.refresh();
        self.view()
    }

    /// Replace the whole state from a query string (`?platform=..&category=..`).
    pub fn apply_query_string(&mut self, qs: &str) -> View {
        self.state = QueryState::from_query_string(qs);
        self.refresh();
        self.view()
    }

    pub fn query_string(&self) -> String { self.state.to_query_string() }

    pub fn view(&self) -> View {
        let catalog = self.store.current();
        build_view(&catalog, &self.state, self.config.page_size)
    }

    pub fn state(&self) -> &QueryState { &self.state }
    pub fn config(&self) -> &GalleryConfig { &self.config }
    pub fn facets(&self) -> &Facets { &self.facets }
    pub fn store(&self) -> &Arc<CatalogStore> { &self.store }

    pub fn tag_window(&self) -> TagWindow<'_> { self.facets.tag_window(self.config.top_tags, self.tags_expanded) }

    /// Show every tag; stays expanded until filters are cleared or the catalog reloads.
    pub fn expand_tags(&mut self) { self.tags_expanded = true; }

    pub fn tags_expanded(&self) -> bool { self.tags_expanded }

    pub fn showcase_current(&self) -> Option<ShowcaseView> {
        let catalog = self.store.current();
        let featured = catalog.showcase();
        let index = self.showcase.current(featured.len())?;
        Some(ShowcaseView { index, count: featured.len(), project: featured[index].clone() })
    }

    pub fn advance_showcase(&mut self) -> Option<ShowcaseView> {
        self.showcase.advance(self.showcase_count())?;
        self.showcase_current()
    }

    pub fn set_showcase(&mut self, index: usize) -> Option<ShowcaseView> {
        self.showcase.set_index(index, self.showcase_count())?;
        self.showcase_current()
    }

    /// Start (or restart) timed rotation. Returns false when there are fewer
    /// than two showcase records; the request is remembered and retried on
    /// every load until `stop_rotation`.
    pub fn start_rotation(&mut self) -> bool {
        self.rotation_wanted = true;
        self.ticks = self.rotation.start(self.config.rotate_period(), self.showcase_count());
        self.ticks.is_some()
    }

    pub fn stop_rotation(&mut self) {
        self.rotation_wanted = false;
        self.rotation.stop();
        self.ticks = None;
    }

    pub fn rotation_running(&self) -> bool { self.rotation.is_running() }

    /// Wait for the next rotation tick and advance. `None` once rotation is
    /// stopped or was never started.
    pub async fn next_showcase(&mut self) -> Option<ShowcaseView> {
        let tick = self.ticks.as_mut()?.recv().await;
        match tick {
            Some(t) => {
                debug!(seq = t.seq, "showcase tick");
                self.advance_showcase()
            }
            None => {
                self.ticks = None;
                None
            }
        }
    }

    fn showcase_count(&self) -> usize { self.store.current().showcase().len() }
}

fn build_view(catalog: &Catalog, state: &QueryState, page_size: usize) -> View {
    let result = evaluate(&catalog.projects, state, page_size);
    let empty = if catalog.is_empty() {
        Some(EmptyState::NoData)
    } else if result.total_matches == 0 {
        Some(EmptyState::NoMatches)
    } else {
        None
    };
    View {
        pagination: Pagination::new(state.page, page_size, result.total_matches),
        total_matches: result.total_matches,
        projects: result.page.into_iter().cloned().collect(),
        state: state.clone(),
        empty,
    }
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::TogglePlatform(_) => "toggle_platform",
        Action::ToggleTag(_) => "toggle_tag",
        Action::AddTag(_) => "add_tag",
        Action::ClearFilters => "clear_filters",
        Action::SetSearch(_) => "set_search",
        Action::ClearSearch => "clear_search",
        Action::SetSort(_) => "set_sort",
        Action::SetDirection(_) => "set_direction",
        Action::SetPage(_) => "set_page",
    }
}
