use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure kinds produced by the individual migration stages.
#[derive(Debug, Error)]
pub enum FinishError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("insertion point not found in {}", .0.display())]
    AnchorMissing(PathBuf),
    #[error("malformed manifest {}: {source}", .path.display())]
    MalformedManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid anchor pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl FinishError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
