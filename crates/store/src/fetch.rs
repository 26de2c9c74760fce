//! Byte sources for catalog files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gallery_core::LoadError;
use tracing::debug;

/// Retrieves the raw bytes behind a location (manifest entry or data file).
#[async_trait::async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, LoadError>;
}

/// Reads locations as paths relative to a root directory (a static-asset tree).
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    pub fn root(&self) -> &Path { &self.root }

    fn resolve(&self, location: &str) -> PathBuf {
        // Site-absolute locations ("/data/x.json") are relative to the asset root.
        self.root.join(location.trim_start_matches('/'))
    }
}

#[async_trait::async_trait]
impl Fetch for FsFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.resolve(location);
        debug!(path = %path.display(), "reading");
        tokio::fs::read(&path).await.map_err(|e| LoadError::Fetch {
            location: location.to_string(),
            reason: e.to_string(),
        })
    }
}

/// In-memory fetcher for tests and embedding. Unknown locations fail as not found.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    entries: HashMap<String, Result<Vec<u8>, String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self { Self::default() }

    pub fn with_bytes(mut self, location: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(location.into(), Ok(bytes.into()));
        self
    }

    pub fn with_json(self, location: impl Into<String>, value: &serde_json::Value) -> Self {
        self.with_bytes(location, value.to_string())
    }

    /// Register a location that fails to fetch (simulated network error).
    pub fn with_failure(mut self, location: impl Into<String>, reason: impl Into<String>) -> Self {
        self.entries.insert(location.into(), Err(reason.into()));
        self
    }
}

#[async_trait::async_trait]
impl Fetch for MemoryFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, LoadError> {
        match self.entries.get(location) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(reason)) => Err(LoadError::Fetch { location: location.to_string(), reason: reason.clone() }),
            None => Err(LoadError::Fetch { location: location.to_string(), reason: "not found".to_string() }),
        }
    }
}
