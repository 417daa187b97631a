//! Error types for codeview.

use crate::filter::FilterError;
use crate::output::OutputError;
use crate::walker::WalkError;

/// Top-level error type for a codeview run.
///
/// Only root-level, configuration-level, and output failures end up here;
/// per-file failures are recorded on the document instead.
#[derive(Debug, thiserror::Error)]
pub enum CodeviewError {
    #[error("{0}")]
    Walk(#[from] WalkError),

    #[error("invalid filter configuration: {0}")]
    Filter(#[from] FilterError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("aborted")]
    Aborted,
}

/// Map an error to its exit code.
pub fn exit_code(error: &CodeviewError) -> i32 {
    match error {
        CodeviewError::Walk(WalkError::RootNotFound { .. })
        | CodeviewError::Walk(WalkError::NotADirectory { .. }) => 3,
        CodeviewError::Walk(WalkError::RootUnreadable { .. }) => 4,
        CodeviewError::Walk(_) => 1,
        CodeviewError::Filter(_) => 2,
        CodeviewError::Output(_) => 1,
        CodeviewError::Io(_) => 1,
        CodeviewError::Aborted => 130,
    }
}
