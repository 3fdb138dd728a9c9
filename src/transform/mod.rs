//! Stream transforms applied by asset tasks.
//!
//! Every transform takes the whole batch a task selected and returns the
//! batch to write. A transform may rename (`.scss` -> `.css`), drop
//! (partials) or add files (useref bundles).
//!
//! | Transform          | Used by       | Backend                 |
//! |--------------------|---------------|-------------------------|
//! | [`StyleTransform`] | style         | grass                   |
//! | [`ScriptTransform`]| script        | oxc transformer         |
//! | [`PageTransform`]  | page          | minijinja               |
//! | [`ImageTransform`] | image, font   | image                   |
//! | [`Identity`]       | extra, tests  | -                       |
//! | [`Useref`]         | useref        | regex                   |
//! | [`Minify`]         | useref        | oxc, lightningcss       |

pub mod minify;
mod optimize;
mod page;
mod script;
mod style;
mod useref;

pub use optimize::{ImageOptions, ImageTransform};
pub use minify::Minify;
pub use page::{PageOptions, PageTransform};
pub use script::{ScriptOptions, ScriptTransform};
pub use style::{StyleOptions, StyleTransform};
pub use useref::{Useref, UserefOptions};

use anyhow::Result;

use crate::asset::Asset;

/// Capability interface over a batch of assets.
pub trait Transform: Send + Sync {
    /// Short name used in error messages.
    fn name(&self) -> &'static str;

    fn apply(&self, assets: Vec<Asset>) -> Result<Vec<Asset>>;
}

/// Passes every asset through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transform for Identity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn apply(&self, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        Ok(assets)
    }
}

/// Runs transforms in order, feeding each the previous output.
pub struct Chain(Vec<Box<dyn Transform>>);

impl Chain {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self(transforms)
    }
}

impl Transform for Chain {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn apply(&self, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        self.0
            .iter()
            .try_fold(assets, |assets, transform| transform.apply(assets))
    }
}

/// Wrap a per-file failure into a [`TaskError::Transform`](crate::asset::TaskError).
pub(crate) fn failure(
    transform: &'static str,
    asset: &Asset,
    message: impl ToString,
) -> anyhow::Error {
    crate::asset::TaskError::Transform {
        transform,
        path: asset.path.clone(),
        message: message.to_string(),
    }
    .into()
}
