//! SCSS compilation via grass.

use std::path::{Path, PathBuf};

use anyhow::Result;
use grass::{Options, OutputStyle};

use super::{Transform, failure};
use crate::asset::Asset;

/// Style compiler settings.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    /// Emit expanded (readable) CSS; minification happens in useref.
    pub expanded: bool,
    /// Extra `@use`/`@import` search directories.
    pub load_paths: Vec<PathBuf>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            expanded: true,
            load_paths: Vec::new(),
        }
    }
}

/// Compiles `.scss`/`.sass` to `.css`. Partials (`_name.scss`) produce no output.
pub struct StyleTransform {
    base: PathBuf,
    options: StyleOptions,
}

impl StyleTransform {
    /// `base` is the directory asset paths are relative to.
    pub fn new(base: impl Into<PathBuf>, options: StyleOptions) -> Self {
        Self {
            base: base.into(),
            options,
        }
    }

    fn grass_options(&self, rel: &Path) -> Options<'static> {
        let style = if self.options.expanded {
            OutputStyle::Expanded
        } else {
            OutputStyle::Compressed
        };

        // imports resolve next to the file first, then the configured paths
        let mut options = Options::default().style(style);
        if let Some(dir) = self.base.join(rel).parent() {
            options = options.load_path(dir);
        }
        for path in &self.options.load_paths {
            options = options.load_path(path);
        }
        options
    }

    fn compile(&self, asset: Asset) -> Result<Asset> {
        let source = asset.text()?.to_string();
        let css = grass::from_string(source, &self.grass_options(&asset.path))
            .map_err(|e| failure(self.name(), &asset, e))?;
        Ok(Asset::new(asset.path, css).with_extension("css"))
    }
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

impl Transform for StyleTransform {
    fn name(&self) -> &'static str {
        "style"
    }

    fn apply(&self, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        assets
            .into_iter()
            .filter(|a| !is_partial(&a.path))
            .map(|a| self.compile(a))
            .collect()
    }
}
