//! Post-processing of compiled pages: reference blocks, then minification.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use super::Task;
use crate::asset::{Asset, select, write_all};
use crate::config::Config;
use crate::debug;
use crate::transform::{Chain, Minify, Transform, Useref, UserefOptions};

/// The `useref` task: pages in `temp` → bundled and minified in `dist`.
pub struct PostProcess {
    glob: String,
    temp: PathBuf,
    dist: PathBuf,
    transform: Arc<dyn Transform>,
}

impl PostProcess {
    pub fn new(config: &Config) -> Self {
        let useref = Useref::new(UserefOptions {
            search_path: vec![config.temp_dir(), config.get_root().to_path_buf()],
            root: config.get_root().to_path_buf(),
        });
        Self::with_transform(
            config,
            Arc::new(Chain::new(vec![Box::new(useref), Box::new(Minify)])),
        )
    }

    pub fn with_transform(config: &Config, transform: Arc<dyn Transform>) -> Self {
        Self {
            glob: config.build.path.pages.clone(),
            temp: config.temp_dir(),
            dist: config.dist_dir(),
            transform,
        }
    }
}

impl Task for PostProcess {
    fn name(&self) -> &str {
        "useref"
    }

    fn run(&self) -> Result<()> {
        let pages = select(&self.glob, &self.temp)?
            .iter()
            .map(|rel| Asset::read(&self.temp, rel))
            .collect::<Result<Vec<_>, _>>()?;

        let outputs = self.transform.apply(pages)?;
        let written = write_all(&self.dist, &outputs)?;
        debug!("useref"; "{} file(s) -> {}", written.len(), self.dist.display());
        Ok(())
    }
}
