//! Page templates rendered with minijinja.

use std::path::PathBuf;

use anyhow::Result;
use minijinja::{Environment, Value, path_loader};

use super::{Transform, failure};
use crate::asset::Asset;

/// Template renderer settings.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    /// Variables available to every page (`[data]` in `pages.toml`).
    pub data: toml::Table,
}

/// Renders every page as a template.
///
/// `{% include %}` and `{% extends %}` resolve against `base`. A fresh
/// environment is built per run, so edited partials are always re-read.
pub struct PageTransform {
    base: PathBuf,
    options: PageOptions,
}

impl PageTransform {
    pub fn new(base: impl Into<PathBuf>, options: PageOptions) -> Self {
        Self {
            base: base.into(),
            options,
        }
    }
}

impl Transform for PageTransform {
    fn name(&self) -> &'static str {
        "page"
    }

    fn apply(&self, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        let mut env = Environment::new();
        env.set_loader(path_loader(&self.base));
        let context = Value::from_serialize(&self.options.data);

        assets
            .into_iter()
            .map(|asset| {
                let name = asset.path.to_string_lossy().replace('\\', "/");
                let source = asset.text()?.to_string();
                let html = env
                    .add_template_owned(name.clone(), source)
                    .and_then(|()| env.get_template(&name)?.render(&context))
                    .map_err(|e| failure(self.name(), &asset, format!("{e:#}")))?;
                Ok(Asset::new(asset.path, html))
            })
            .collect()
    }
}
