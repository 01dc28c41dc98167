use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the timeline library.
///
/// Geometry never fails: bars or connectors with unusable input are skipped
/// during layout. Only loading, lookups and drag-session misuse report errors.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("item {0} not found")]
    ItemNotFound(Uuid),

    #[error("item {item} has no period at index {index}")]
    PeriodNotFound { item: Uuid, index: usize },

    #[error("a drag session is already active")]
    DragInProgress,

    #[error("no drag session is active")]
    NoActiveSession,
}

impl TimelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TimelineError>;
