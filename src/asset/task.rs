//! Asset task: one glob, one transform, one destination.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use super::{Asset, select, write_all};
use crate::config::Config;
use crate::core::AssetKind;
use crate::debug;
use crate::pipeline::Task;
use crate::reload::{LiveReload, ReloadStream};
use crate::transform::Transform;

/// Immutable description of an asset task, created once from the config.
pub struct AssetTask {
    kind: AssetKind,
    glob: String,
    base: PathBuf,
    transform: Arc<dyn Transform>,
    dest: PathBuf,
    reload: Option<ReloadStream>,
}

impl AssetTask {
    /// Task for `kind` with the glob, base and destination the config assigns.
    pub fn new(kind: AssetKind, config: &Config, transform: Arc<dyn Transform>) -> Self {
        Self {
            kind,
            glob: kind.glob(config).to_string(),
            base: kind.base(config),
            transform,
            dest: kind.dest(config),
            reload: None,
        }
    }

    /// Notify `reload` after each run, if this asset class reloads.
    pub fn with_reload(mut self, reload: Arc<dyn LiveReload>) -> Self {
        if self.kind.reloads() {
            self.reload = Some(ReloadStream::new(reload));
        }
        self
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn glob(&self) -> &str {
        &self.glob
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Select, transform and write. Returns the absolute paths written.
    pub fn execute(&self) -> Result<Vec<PathBuf>> {
        let sources = select(&self.glob, &self.base)?;
        let assets = sources
            .iter()
            .map(|rel| Asset::read(&self.base, rel))
            .collect::<Result<Vec<_>, _>>()?;

        let outputs = self.transform.apply(assets)?;
        let written = write_all(&self.dest, &outputs)?;

        if let Some(stream) = &self.reload {
            stream.apply(outputs)?;
        }

        debug!(self.kind.task_name(); "{} file(s) -> {}", written.len(), self.dest.display());
        Ok(written)
    }
}

impl Task for AssetTask {
    fn name(&self) -> &str {
        self.kind.task_name()
    }

    fn run(&self) -> Result<()> {
        self.execute().map(drop)
    }
}
