//! Asset class definitions.

use std::path::PathBuf;

use crate::config::Config;

/// Class of source asset, determines glob, destination and reload behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// SCSS stylesheets compiled to CSS
    Styles,
    /// JavaScript transpiled to the baseline target
    Scripts,
    /// HTML templates rendered with `data`
    Pages,
    /// Raster images, recompressed
    Images,
    /// Font files, recompressed when possible
    Fonts,
    /// Public files copied verbatim
    Extras,
}

impl AssetKind {
    pub const ALL: [Self; 6] = [
        Self::Styles,
        Self::Scripts,
        Self::Pages,
        Self::Images,
        Self::Fonts,
        Self::Extras,
    ];

    /// Name of the task running this asset class.
    pub fn task_name(self) -> &'static str {
        match self {
            Self::Styles => "style",
            Self::Scripts => "script",
            Self::Pages => "page",
            Self::Images => "image",
            Self::Fonts => "font",
            Self::Extras => "extra",
        }
    }

    /// Parse a task name back into its asset class.
    pub fn from_task_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.task_name() == name)
    }

    /// Source glob from config. Extras match everything under `public`.
    pub fn glob(self, config: &Config) -> &str {
        let paths = &config.build.path;
        match self {
            Self::Styles => &paths.styles,
            Self::Scripts => &paths.scripts,
            Self::Pages => &paths.pages,
            Self::Images => &paths.images,
            Self::Fonts => &paths.fonts,
            Self::Extras => "**",
        }
    }

    /// Directory the glob is relative to.
    pub fn base(self, config: &Config) -> PathBuf {
        match self {
            Self::Extras => config.public_dir(),
            _ => config.src_dir(),
        }
    }

    /// Compiled-but-unminified output goes to `temp`, the rest to `dist`.
    pub fn dest(self, config: &Config) -> PathBuf {
        if self.is_intermediate() {
            config.temp_dir()
        } else {
            config.dist_dir()
        }
    }

    /// Whether output is post-processed before it is distributable.
    #[inline]
    pub fn is_intermediate(self) -> bool {
        matches!(self, Self::Styles | Self::Scripts | Self::Pages)
    }

    /// Whether a run notifies the live-reload service.
    #[inline]
    pub fn reloads(self) -> bool {
        self.is_intermediate()
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.task_name())
    }
}
