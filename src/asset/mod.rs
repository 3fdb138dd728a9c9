//! Asset tasks: select, transform and write one class of source file.
//!
//! ```text
//! base/<glob> ──select──▶ Vec<Asset> ──Transform──▶ Vec<Asset> ──write──▶ dest/
//! ```
//!
//! Asset paths stay relative to the task's base directory for the whole
//! trip, so output mirrors the source layout under the destination.

mod error;
mod scan;
mod task;

pub use error::TaskError;
pub use scan::{compile, matches, select};
pub use task::AssetTask;

use std::fs;
use std::path::{Path, PathBuf};

/// One file flowing through a transform chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Path relative to the task base (and to the destination on write).
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl Asset {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Read `base/rel` into an asset keyed by `rel`.
    pub fn read(base: &Path, rel: &Path) -> Result<Self, TaskError> {
        let abs = base.join(rel);
        let contents = fs::read(&abs).map_err(|e| TaskError::Io(abs, e))?;
        Ok(Self::new(rel, contents))
    }

    /// Contents as UTF-8 text, failing with the asset path on invalid bytes.
    pub fn text(&self) -> anyhow::Result<&str> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| anyhow::anyhow!("{} is not valid UTF-8: {}", self.path.display(), e))
    }

    /// Lowercase file extension, empty when there is none.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default()
    }

    /// Replace the extension, keeping the rest of the path.
    pub fn with_extension(mut self, ext: &str) -> Self {
        self.path.set_extension(ext);
        self
    }
}

/// Write assets under `dest`, creating parent directories as needed.
///
/// Returns the absolute paths written, in input order. Writes are plain
/// overwrites; concurrent tasks rely on disjoint globs.
pub fn write_all(dest: &Path, assets: &[Asset]) -> Result<Vec<PathBuf>, TaskError> {
    assets
        .iter()
        .map(|asset| {
            let out = dest.join(&asset.path);
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent).map_err(|e| TaskError::Io(parent.to_path_buf(), e))?;
            }
            fs::write(&out, &asset.contents).map_err(|e| TaskError::Io(out.clone(), e))?;
            Ok(out)
        })
        .collect()
}
