//! Configuration error types.

use super::FieldPath;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// ConfigError
// ============================================================================

/// Reasons an override file is rejected.
///
/// The resolver never surfaces these: any of them makes it fall back to the
/// built-in defaults. They exist so the fallback can be logged under
/// `--verbose` and asserted on in tests.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config serialization error")]
    Serialize(#[from] toml::ser::Error),

    #[error("{0} must not be empty")]
    EmptyField(FieldPath),

    #[error("{0} must be between 1 and 100, got {1}")]
    OutOfRange(FieldPath, u8),
}
