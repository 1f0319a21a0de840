//! Errors that abort a run before any repository is touched

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Invocation-level failures. Per-repository problems never surface here;
/// they are folded into an [`Outcome`](crate::git::Outcome) instead.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("directory '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot read directory '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("concurrency must be at least 1 (got {0})")]
    InvalidConcurrency(usize),

    #[error("timeout must be greater than zero")]
    InvalidTimeout,
}
