//! Configuration section definitions.
//!
//! Each module corresponds to a section in `pages.toml`:
//!
//! | Module     | TOML Section   | Purpose                           |
//! |------------|----------------|-----------------------------------|
//! | `build`    | `[build]`      | Directory layout and asset globs  |
//! | `serve`    | `[serve]`      | Development server                |

mod build;
mod serve;

pub use build::{AssetPaths, BuildSectionConfig, ImageSettings};
pub use serve::ServeConfig;
