//! Manifest and data-file loading with concurrent fan-out.

use std::time::Instant;

use futures::future::join_all;
use gallery_core::{LoadError, Project};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::fetch::Fetch;

/// Where records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// `{ "repoFiles": [...] }` naming further data files.
    Manifest(String),
    /// A data file holding one record or an array of records.
    Data(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    #[serde(default)]
    repo_files: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataFile {
    Many(Vec<Project>),
    One(Project),
}

impl DataFile {
    fn into_projects(self) -> Vec<Project> {
        match self {
            DataFile::Many(v) => v,
            DataFile::One(p) => vec![p],
        }
    }
}

/// A data file that contributed nothing to the load.
#[derive(Debug)]
pub struct SourceFailure {
    pub location: String,
    pub error: LoadError,
}

/// Result of one load cycle: records in source order plus per-file diagnostics.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub projects: Vec<Project>,
    /// Data locations attempted (after manifest expansion).
    pub files: usize,
    pub failures: Vec<SourceFailure>,
}

/// Load all sources. Manifests are resolved first; then every data file is fetched
/// concurrently and the call waits for all of them. A failing data file is logged and
/// skipped; only an unreadable manifest fails the whole load.
pub async fn load<F: Fetch + ?Sized>(fetcher: &F, sources: &[Source]) -> Result<LoadReport, LoadError> {
    let started = Instant::now();
    let mut locations: Vec<String> = Vec::new();
    for src in sources {
        match src {
            Source::Manifest(loc) => locations.extend(read_manifest(fetcher, loc).await?),
            Source::Data(loc) => locations.push(loc.clone()),
        }
    }

    let results = join_all(locations.iter().map(|loc| load_data_file(fetcher, loc))).await;

    let mut report = LoadReport { files: locations.len(), ..LoadReport::default() };
    for (loc, res) in locations.into_iter().zip(results) {
        match res {
            Ok(mut projects) => {
                debug!(location = %loc, records = projects.len(), "data file loaded");
                report.projects.append(&mut projects);
            }
            Err(e) => {
                error!(location = %loc, error = %e, "skipping data file");
                metrics::counter!("load_failures_total", 1u64, "phase" => e.phase());
                report.failures.push(SourceFailure { location: loc, error: e });
            }
        }
    }
    info!(
        files = report.files,
        failed = report.failures.len(),
        records = report.projects.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "load finished"
    );
    Ok(report)
}

async fn read_manifest<F: Fetch + ?Sized>(fetcher: &F, location: &str) -> Result<Vec<String>, LoadError> {
    let bytes = fetcher.fetch(location).await.map_err(|e| manifest_error(location, e.to_string()))?;
    let manifest: Manifest = serde_json::from_slice(&bytes).map_err(|e| manifest_error(location, e.to_string()))?;
    if manifest.repo_files.is_empty() {
        warn!(location = %location, "manifest lists no data files");
    } else {
        info!(location = %location, files = manifest.repo_files.len(), "manifest loaded");
    }
    Ok(manifest.repo_files)
}

fn manifest_error(location: &str, reason: String) -> LoadError {
    metrics::counter!("load_failures_total", 1u64, "phase" => "manifest");
    LoadError::Manifest { location: location.to_string(), reason }
}

async fn load_data_file<F: Fetch + ?Sized>(fetcher: &F, location: &str) -> Result<Vec<Project>, LoadError> {
    let bytes = fetcher.fetch(location).await?;
    let file: DataFile = serde_json::from_slice(&bytes)
        .map_err(|source| LoadError::Parse { location: location.to_string(), source })?;
    Ok(file.into_projects())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;
    use serde_json::json;

    fn names(r: &LoadReport) -> Vec<&str> { r.projects.iter().map(|p| p.name.as_str()).collect() }

    #[tokio::test]
    async fn manifest_expands_and_flattens_in_order() {
        let f = MemoryFetcher::new()
            .with_json("data/manifest.json", &json!({ "repoFiles": ["data/a.json", "data/b.json"] }))
            .with_json("data/a.json", &json!([{ "name": "a1" }, { "name": "a2" }]))
            .with_json("data/b.json", &json!({ "name": "b1" }));
        let report = load(&f, &[Source::Manifest("data/manifest.json".into())]).await.unwrap();
        assert_eq!(names(&report), ["a1", "a2", "b1"]);
        assert_eq!(report.files, 2);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn failing_files_are_skipped() {
        let f = MemoryFetcher::new()
            .with_json("m.json", &json!({ "repoFiles": ["ok.json", "down.json", "broken.json", "missing.json"] }))
            .with_json("ok.json", &json!([{ "name": "ok" }]))
            .with_failure("down.json", "connection reset")
            .with_bytes("broken.json", "{ not json");
        let report = load(&f, &[Source::Manifest("m.json".into())]).await.unwrap();
        assert_eq!(names(&report), ["ok"]);
        let failed: Vec<_> = report.failures.iter().map(|f| (f.location.as_str(), f.error.phase())).collect();
        assert_eq!(failed, [("down.json", "fetch"), ("broken.json", "parse"), ("missing.json", "fetch")]);
    }

    #[tokio::test]
    async fn manifest_failure_is_total() {
        let f = MemoryFetcher::new().with_bytes("m.json", "[1, 2");
        let err = load(&f, &[Source::Manifest("m.json".into())]).await.unwrap_err();
        assert!(matches!(err, LoadError::Manifest { .. }));

        let err = load(&MemoryFetcher::new(), &[Source::Manifest("absent.json".into())]).await.unwrap_err();
        assert_eq!(err.location(), "absent.json");
    }

    #[tokio::test]
    async fn empty_manifest_yields_no_records() {
        let f = MemoryFetcher::new().with_json("m.json", &json!({}));
        let report = load(&f, &[Source::Manifest("m.json".into())]).await.unwrap();
        assert!(report.projects.is_empty());
        assert_eq!(report.files, 0);
    }

    #[tokio::test]
    async fn direct_data_sources() {
        let f = MemoryFetcher::new()
            .with_json("x.json", &json!([{ "name": "x", "categories": ["Audio"] }]))
            .with_json("y.json", &json!([{ "name": "y" }]));
        let report = load(&f, &[Source::Data("x.json".into()), Source::Data("y.json".into())]).await.unwrap();
        assert_eq!(names(&report), ["x", "y"]);
        assert_eq!(report.projects[0].tags.as_slice(), ["Audio"]);
    }
}
