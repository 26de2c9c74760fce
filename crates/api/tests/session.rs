use std::sync::Arc;
use std::time::Duration;

use gallery_api::{EmptyState, Session};
use gallery_core::{Action, GalleryConfig, LoadError, SortKey};
use gallery_store::{CatalogStore, Fetch, MemoryFetcher, Source};
use serde_json::json;

fn fixture() -> MemoryFetcher {
    MemoryFetcher::new()
        .with_json("data/manifest.json", &json!({ "repoFiles": ["data/a.json", "data/b.json", "data/broken.json"] }))
        .with_json(
            "data/a.json",
            &json!([
                { "name": "Edge Vision", "author": "Qualcomm", "stars": 5, "tags": ["Vision"], "platforms": ["Android"],
                  "lastUpdated": "2024-03-01", "isShowcase": true },
                { "name": "Whisper Port", "stars": 10, "tags": ["Vision", "Audio"], "platforms": ["Windows"],
                  "lastUpdated": "2024-05-01", "isShowcase": true }
            ]),
        )
        .with_json("data/b.json", &json!({ "name": "Chat Kit", "categories": ["LLM"], "platforms": ["Linux"], "isShowcase": true }))
        .with_bytes("data/broken.json", "{ not json")
}

fn session(fetcher: MemoryFetcher) -> Session {
    let config = GalleryConfig { rotate_ms: 1_000, ..GalleryConfig::default() };
    Session::new(Arc::new(fetcher), vec![Source::Manifest("data/manifest.json".into())], config)
}

fn names(v: &gallery_api::View) -> Vec<&str> { v.projects.iter().map(|p| p.name.as_str()).collect() }

#[tokio::test]
async fn before_load_the_view_reports_no_data() {
    let s = session(fixture());
    let v = s.view();
    assert_eq!(v.empty, Some(EmptyState::NoData));
    assert!(s.facets().is_empty());
    assert!(s.showcase_current().is_none());
}

#[tokio::test]
async fn load_tolerates_broken_file_and_builds_facets() {
    let mut s = session(fixture());
    let out = s.load().await.unwrap();
    assert_eq!(out.records, 3);
    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].location, "data/broken.json");

    let platforms: Vec<_> = s.facets().platforms.iter().map(|f| f.value.as_str()).collect();
    assert_eq!(platforms, ["android", "linux", "windows"]);
    assert_eq!(s.facets().tags[0].value, "vision");
    assert_eq!(s.facets().tags[0].count, 2);

    // default sort: lastUpdated desc, missing date last
    assert_eq!(names(&s.view()), ["Whisper Port", "Edge Vision", "Chat Kit"]);
}

#[tokio::test]
async fn dispatch_runs_the_reducer_and_engine() {
    let mut s = session(fixture());
    s.load().await.unwrap();

    let v = s.dispatch(Action::ToggleTag("Vision".into()));
    assert_eq!(v.total_matches, 2);
    let v = s.dispatch(Action::SetSort(SortKey::Stars));
    assert_eq!(names(&v), ["Whisper Port", "Edge Vision"]);

    let v = s.dispatch(Action::SetSearch("  QUALCOMM ".into()));
    assert_eq!(names(&v), ["Edge Vision"]);
    assert_eq!(v.state.search, "qualcomm");

    let v = s.dispatch(Action::AddTag("audio".into()));
    assert!(v.state.search.is_empty());
    assert_eq!(names(&v), ["Whisper Port"]);

    let v = s.dispatch(Action::TogglePlatform("linux".into()));
    assert_eq!(v.empty, Some(EmptyState::NoMatches));

    let v = s.dispatch(Action::ClearFilters);
    assert_eq!(v.total_matches, 3);
    assert_eq!(v.state.sort, SortKey::Stars);
}

#[tokio::test]
async fn page_past_end_is_empty_with_total() {
    let mut s = session(fixture());
    s.load().await.unwrap();
    let v = s.dispatch(Action::SetPage(5));
    assert!(v.projects.is_empty());
    assert_eq!(v.total_matches, 3);
    assert_eq!(v.empty, None);
    // any non-page action returns to page 1
    let v = s.dispatch(Action::SetSort(SortKey::Name));
    assert_eq!(v.state.page, 1);
    assert_eq!(v.projects.len(), 3);
}

#[tokio::test]
async fn query_string_round_trips_through_session() {
    let mut s = session(fixture());
    s.load().await.unwrap();
    let v = s.apply_query_string("?platform=Windows&category=audio&sort=stars&direction=asc");
    assert_eq!(names(&v), ["Whisper Port"]);
    let qs = s.query_string();
    assert!(qs.contains("platform=windows"));
    assert!(qs.contains("category=audio"));
    assert!(qs.contains("sort=stars"));
}

#[tokio::test]
async fn tag_expansion_resets_on_clear_and_reload() {
    let mut s = session(fixture());
    s.load().await.unwrap();
    s.expand_tags();
    assert!(s.tags_expanded());
    s.dispatch(Action::ClearFilters);
    assert!(!s.tags_expanded());
    s.expand_tags();
    s.load().await.unwrap();
    assert!(!s.tags_expanded());
    assert_eq!(s.tag_window().total(), 3);
}

#[tokio::test]
async fn failed_manifest_keeps_previous_catalog() {
    let mut s = session(fixture());
    s.load().await.unwrap();
    let store = s.store().clone();
    let mut broken = Session::with_store(
        store,
        Arc::new(MemoryFetcher::new()),
        vec![Source::Manifest("data/manifest.json".into())],
        GalleryConfig::default(),
    );
    let err = broken.load().await.unwrap_err();
    assert_eq!(err.phase(), "manifest");
    assert_eq!(broken.view().total_matches, 3);
    assert_eq!(broken.facets().platforms.len(), 3);
}

#[tokio::test]
async fn showcase_manual_navigation_wraps() {
    let mut s = session(fixture());
    s.load().await.unwrap();
    let first = s.showcase_current().unwrap();
    assert_eq!((first.index, first.count), (0, 3));
    assert_eq!(first.project.name, "Edge Vision");
    assert_eq!(s.advance_showcase().unwrap().project.name, "Whisper Port");
    assert_eq!(s.set_showcase(5).unwrap().index, 2);
    assert_eq!(s.advance_showcase().unwrap().index, 0);
}

#[tokio::test(start_paused = true)]
async fn rotation_advances_on_ticks_and_stops() {
    let mut s = session(fixture());
    s.load().await.unwrap();
    assert!(s.start_rotation());
    let started = tokio::time::Instant::now();
    assert_eq!(s.next_showcase().await.unwrap().index, 1);
    assert!(started.elapsed() >= Duration::from_millis(1_000));
    assert_eq!(s.next_showcase().await.unwrap().index, 2);

    // a reload resets the index and keeps rotating
    s.load().await.unwrap();
    assert!(s.rotation_running());
    assert_eq!(s.showcase_current().unwrap().index, 0);
    assert_eq!(s.next_showcase().await.unwrap().index, 1);

    s.stop_rotation();
    assert!(!s.rotation_running());
    assert!(s.next_showcase().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn single_showcase_does_not_rotate() {
    let fetcher = MemoryFetcher::new()
        .with_json("m.json", &json!({ "repoFiles": ["one.json"] }))
        .with_json("one.json", &json!([{ "name": "solo", "isShowcase": true }, { "name": "plain" }]));
    let mut s = Session::new(Arc::new(fetcher), vec![Source::Manifest("m.json".into())], GalleryConfig::default());
    s.load().await.unwrap();
    assert!(!s.start_rotation());
    assert!(s.next_showcase().await.is_none());
    assert_eq!(s.showcase_current().unwrap().project.name, "solo");
}

/// Serves whatever fixture is currently installed, so one session can see the catalog change.
#[derive(Default)]
struct Swappable(std::sync::Mutex<MemoryFetcher>);

impl Swappable {
    fn set(&self, f: MemoryFetcher) { *self.0.lock().unwrap() = f; }
}

#[async_trait::async_trait]
impl Fetch for Swappable {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, LoadError> {
        let inner = self.0.lock().unwrap().clone();
        inner.fetch(location).await
    }
}

/// Starts a newer load on the shared store mid-fetch, so the caller's load is superseded.
struct Overtaken {
    store: Arc<CatalogStore>,
    inner: MemoryFetcher,
}

#[async_trait::async_trait]
impl Fetch for Overtaken {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, LoadError> {
        self.store.begin_load();
        self.inner.fetch(location).await
    }
}

fn featured(names: &[&str]) -> MemoryFetcher {
    let records: Vec<_> = names.iter().map(|n| json!({ "name": n, "isShowcase": true })).collect();
    MemoryFetcher::new().with_json("m.json", &json!({ "repoFiles": ["d.json"] })).with_json("d.json", &json!(records))
}

#[tokio::test(start_paused = true)]
async fn requested_rotation_starts_once_reload_adds_showcase_records() {
    let fetcher = Arc::new(Swappable::default());
    fetcher.set(featured(&["solo"]));
    let config = GalleryConfig { rotate_ms: 1_000, ..GalleryConfig::default() };
    let mut s = Session::new(fetcher.clone(), vec![Source::Manifest("m.json".into())], config);
    s.load().await.unwrap();
    assert!(!s.start_rotation());
    assert!(!s.rotation_running());

    fetcher.set(featured(&["one", "two", "three"]));
    s.load().await.unwrap();
    assert!(s.rotation_running());
    assert_eq!(s.next_showcase().await.unwrap().index, 1);

    // an explicit stop is remembered across loads
    s.stop_rotation();
    s.load().await.unwrap();
    assert!(!s.rotation_running());
}

#[tokio::test]
async fn superseded_load_leaves_session_state_alone() {
    let mut first = session(fixture());
    first.load().await.unwrap();
    let store = first.store().clone();

    let fetcher = Overtaken { store: store.clone(), inner: fixture() };
    let mut s = Session::with_store(
        store.clone(),
        Arc::new(fetcher),
        vec![Source::Manifest("data/manifest.json".into())],
        GalleryConfig::default(),
    );
    s.advance_showcase();
    s.expand_tags();
    let out = s.load().await.unwrap();
    assert_eq!(out.generation, None);
    assert_eq!(store.generation(), 1);
    assert_eq!(s.showcase_current().unwrap().index, 1);
    assert!(s.tags_expanded());
}
