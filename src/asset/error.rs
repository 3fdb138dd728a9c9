//! Asset task errors.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single asset task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The transform rejected a batch of assets
    #[error("{transform} failed on {}: {message}", path.display())]
    Transform {
        transform: &'static str,
        path: PathBuf,
        message: String,
    },

    /// Reading, writing or listing a file failed
    #[error("I/O error at {}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    /// The configured glob is not a valid pattern
    #[error("invalid glob `{0}`")]
    Glob(String, #[source] glob::PatternError),
}
