//! `[build]` section configuration.
//!
//! Directory layout and the source globs of every asset task.
//!
//! # Example
//!
//! ```toml
//! [build]
//! src = "src"                 # Authored content
//! dist = "dist"               # Final, minified output
//! temp = "temp"               # Compiled but not yet minified output
//! public = "public"           # Copied verbatim, served directly in develop
//!
//! [build.path]
//! styles = "assets/styles/*.scss"
//! scripts = "assets/scripts/*.js"
//! pages = "*.html"
//! images = "assets/images/**"
//! fonts = "assets/fonts/**"
//!
//! [build.images]
//! jpeg_quality = 80           # Omit to copy JPEG files untouched
//! ```
//!
//! Globs are relative to `src`. An override that sets `[build.path]`
//! replaces the whole table, so every glob must be listed again.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::FieldPath;

/// Directory layout and asset globs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSectionConfig {
    /// Authored sources.
    pub src: PathBuf,

    /// Final distributable output.
    pub dist: PathBuf,

    /// Intermediate output of styles, scripts and pages.
    pub temp: PathBuf,

    /// Files copied verbatim and served as-is in develop mode.
    pub public: PathBuf,

    /// Source globs, one per asset class.
    pub path: AssetPaths,

    /// Image optimizer settings.
    #[serde(default)]
    pub images: ImageSettings,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            src: "src".into(),
            dist: "dist".into(),
            temp: "temp".into(),
            public: "public".into(),
            path: AssetPaths::default(),
            images: ImageSettings::default(),
        }
    }
}

/// `[build.images]`: how the image and font tasks recompress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSettings {
    /// Re-encode JPEG at this quality (1-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jpeg_quality: Option<u8>,
}

/// Source glob per asset class, relative to `build.src`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPaths {
    pub styles: String,
    pub scripts: String,
    pub pages: String,
    pub images: String,
    pub fonts: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            styles: "assets/styles/*.scss".into(),
            scripts: "assets/scripts/*.js".into(),
            pages: "*.html".into(),
            images: "assets/images/**".into(),
            fonts: "assets/fonts/**".into(),
        }
    }
}

impl BuildSectionConfig {
    /// Every path-like field paired with its config key.
    pub fn fields(&self) -> [(FieldPath, &str); 9] {
        fn dir(p: &PathBuf) -> &str {
            p.to_str().unwrap_or_default()
        }
        [
            (FieldPath::new("build.src"), dir(&self.src)),
            (FieldPath::new("build.dist"), dir(&self.dist)),
            (FieldPath::new("build.temp"), dir(&self.temp)),
            (FieldPath::new("build.public"), dir(&self.public)),
            (FieldPath::new("build.path.styles"), &self.path.styles),
            (FieldPath::new("build.path.scripts"), &self.path.scripts),
            (FieldPath::new("build.path.pages"), &self.path.pages),
            (FieldPath::new("build.path.images"), &self.path.images),
            (FieldPath::new("build.path.fonts"), &self.path.fonts),
        ]
    }
}
