use thiserror::Error;

/// Failures raised while loading catalog sources.
///
/// `Fetch` and `Parse` are per-file and tolerated by the loader; `Manifest`
/// is the only variant that aborts a load cycle.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("fetch {location}: {reason}")]
    Fetch { location: String, reason: String },
    #[error("parse {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("manifest {location}: {reason}")]
    Manifest { location: String, reason: String },
}

impl LoadError {
    pub fn location(&self) -> &str {
        match self {
            LoadError::Fetch { location, .. }
            | LoadError::Parse { location, .. }
            | LoadError::Manifest { location, .. } => location,
        }
    }

    /// Short label used for metrics and log fields.
    pub fn phase(&self) -> &'static str {
        match self {
            LoadError::Fetch { .. } => "fetch",
            LoadError::Parse { .. } => "parse",
            LoadError::Manifest { .. } => "manifest",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {what}: {value:?} (expected one of: {expected})")]
pub struct ParseKeyError {
    pub what: &'static str,
    pub value: String,
    pub expected: &'static str,
}
