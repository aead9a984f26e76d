use thiserror::Error;
use wfd_core::error::{DocumentError, LayoutError};

/// Failures surfaced to the user. Invariant guards (stale ids, self-loops,
/// duplicate connections) are never errors; they are silent no-ops.
#[derive(Debug, Error)]
pub enum DesignerError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// A save or load is outstanding and the workflow is read-only.
    #[error("the workflow is read-only while a save or load is in progress")]
    StoreFrozen,

    #[error("failed to record undo snapshot: {0}")]
    SnapshotEncode(#[from] rmp_serde::encode::Error),

    #[error("failed to restore undo snapshot: {0}")]
    SnapshotDecode(#[from] rmp_serde::decode::Error),

    /// A handler panicked; the gesture was reset and the session goes on.
    #[error("internal error while handling {event}: {message}")]
    Internal {
        event: &'static str,
        message: String,
    },
}

impl DesignerError {
    /// Whether the caller should show this to the user as a validation
    /// failure (as opposed to a bug report).
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, DesignerError::Internal { .. })
    }
}
