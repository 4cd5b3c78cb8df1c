use std::path::PathBuf;

/// Errors surfaced by catalog loading, report writing, and inventory queries.
///
/// Per-file problems during a scan are recorded on the individual
/// [`Finding`](crate::scan::Finding) instead and never abort the scan.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed advisory database: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("package inventory unavailable: {0}")]
    Inventory(String),
}

impl CoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io {
            path: path.into(),
            source,
        }
    }
}
