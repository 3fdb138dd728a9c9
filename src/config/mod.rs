//! Project configuration for `pages.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build] and [build.path]
//! │   └── serve      # [serve]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError
//! │   └── field      # FieldPath
//! ├── merge.rs       # Shallow override merge
//! └── mod.rs         # Config + resolve (this file)
//! ```
//!
//! # Resolution
//!
//! [`resolve`] starts from the built-in defaults and applies the optional
//! `pages.toml` found in the working directory:
//!
//! | Override key       | Effect                                          |
//! |--------------------|-------------------------------------------------|
//! | `build.<key>`      | Replaces the default `build.<key>` wholesale    |
//! | any other key      | Replaces the default top-level key wholesale    |
//!
//! A missing or broken override file is not an error: the defaults are used
//! as they are.

mod merge;
pub mod section;
pub mod types;

pub use merge::shallow_merge;
pub use section::{AssetPaths, BuildSectionConfig, ImageSettings, ServeConfig};
pub use types::{ConfigError, FieldPath};

use crate::debug;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Name of the project override file, looked up in the working directory.
pub const CONFIG_FILE: &str = "pages.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration shared read-only by every task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Working directory every relative path is resolved against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Directory layout and asset globs
    #[serde(default)]
    pub build: BuildSectionConfig,

    /// Template variables handed to the page renderer
    #[serde(default)]
    pub data: toml::Table,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Additional top-level keys from the override, kept verbatim
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            build: BuildSectionConfig::default(),
            data: toml::Table::new(),
            serve: ServeConfig::default(),
            extra: toml::Table::new(),
        }
    }
}

/// Merge the override file in `cwd` into `defaults`.
///
/// Never fails: a missing file, a TOML syntax error or an override whose
/// merged shape is invalid all yield `defaults` unchanged (rooted at `cwd`).
pub fn resolve(defaults: Config, cwd: &Path) -> Config {
    match load_override(&defaults, cwd) {
        Ok(Some(config)) => {
            debug!("config"; "loaded {}", cwd.join(CONFIG_FILE).display());
            config
        }
        Ok(None) => defaults.with_root(cwd),
        Err(err) => {
            debug!("config"; "ignoring {}: {:#}", CONFIG_FILE, anyhow::Error::from(err));
            defaults.with_root(cwd)
        }
    }
}

/// Read, merge and validate the override. `Ok(None)` when there is no file.
fn load_override(defaults: &Config, cwd: &Path) -> Result<Option<Config>, ConfigError> {
    let path = cwd.join(CONFIG_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(ConfigError::Io(path, err)),
    };

    let overlay: toml::Table = toml::from_str(&content)?;
    let base = match toml::Value::try_from(defaults)? {
        toml::Value::Table(table) => table,
        _ => toml::Table::new(),
    };

    let merged: Config = toml::Value::Table(shallow_merge(base, overlay)).try_into()?;
    merged.validate()?;
    Ok(Some(merged.with_root(cwd)))
}

impl Config {
    /// Set the working directory and return self.
    pub fn with_root(mut self, root: &Path) -> Self {
        self.root = root.to_path_buf();
        self
    }

    /// Check the non-empty invariant of every path field and the JPEG
    /// quality range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in self.build.fields() {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField(field));
            }
        }
        if let Some(quality) = self.build.images.jpeg_quality
            && !(1..=100).contains(&quality)
        {
            return Err(ConfigError::OutOfRange(
                FieldPath::new("build.images.jpeg_quality"),
                quality,
            ));
        }
        Ok(())
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Get path relative to the project root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root_join(&self.build.src)
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.root_join(&self.build.dist)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root_join(&self.build.temp)
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root_join(&self.build.public)
    }
}

/// Parse a config snippet directly, without the override merge.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> Config {
    toml::from_str(content).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_override(dir: &TempDir, content: &str) {
        fs::write(dir.path().join(CONFIG_FILE), content).unwrap();
    }

    fn defaults_at(dir: &TempDir) -> Config {
        Config::default().with_root(dir.path())
    }

    #[test]
    fn test_resolve_without_override() {
        let dir = TempDir::new().unwrap();
        let config = resolve(Config::default(), dir.path());
        assert_eq!(config, defaults_at(&dir));
        assert_eq!(config.get_root(), dir.path());
    }

    #[test]
    fn test_override_build_src_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        write_override(&dir, "[build]\nsrc = \"app\"\n");

        let config = resolve(Config::default(), dir.path());
        assert_eq!(config.build.src, PathBuf::from("app"));
        assert_eq!(config.build.dist, PathBuf::from("dist"));
        assert_eq!(config.build.temp, PathBuf::from("temp"));
        assert_eq!(config.build.path, AssetPaths::default());
        assert_eq!(config.serve, ServeConfig::default());
        assert_eq!(config.src_dir(), dir.path().join("app"));
    }

    #[test]
    fn test_override_path_table_replaced_wholesale() {
        let dir = TempDir::new().unwrap();
        write_override(
            &dir,
            r#"
[build.path]
styles = "css/**/*.scss"
scripts = "js/*.js"
pages = "**/*.html"
images = "img/**"
fonts = "font/**"
"#,
        );

        let config = resolve(Config::default(), dir.path());
        assert_eq!(config.build.path.styles, "css/**/*.scss");
        assert_eq!(config.build.path.pages, "**/*.html");
        assert_eq!(config.build.src, PathBuf::from("src"));
    }

    #[test]
    fn test_partial_path_table_is_not_deep_merged() {
        let dir = TempDir::new().unwrap();
        // `build.path` replaces the default table, leaving the other globs
        // undefined, so the override is rejected as a whole.
        write_override(&dir, "[build.path]\nstyles = \"css/*.scss\"\n");

        let config = resolve(Config::default(), dir.path());
        assert_eq!(config, defaults_at(&dir));
    }

    #[test]
    fn test_malformed_override_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        write_override(&dir, "[build\nsrc = ");

        let config = resolve(Config::default(), dir.path());
        assert_eq!(config, defaults_at(&dir));
    }

    #[test]
    fn test_wrong_type_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        write_override(&dir, "build = 42\n");

        let config = resolve(Config::default(), dir.path());
        assert_eq!(config, defaults_at(&dir));
    }

    #[test]
    fn test_empty_path_field_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        write_override(&dir, "[build]\ndist = \"\"\n");

        let config = resolve(Config::default(), dir.path());
        assert_eq!(config, defaults_at(&dir));
    }

    #[test]
    fn test_image_settings_override() {
        let dir = TempDir::new().unwrap();
        write_override(&dir, "[build.images]\njpeg_quality = 75\n");

        let config = resolve(Config::default(), dir.path());
        assert_eq!(config.build.images.jpeg_quality, Some(75));
        assert_eq!(config.build.path, AssetPaths::default());
    }

    #[test]
    fn test_jpeg_quality_out_of_range_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        write_override(&dir, "[build.images]\njpeg_quality = 0\n");

        let config = resolve(Config::default(), dir.path());
        assert_eq!(config, defaults_at(&dir));
        assert_eq!(config.build.images, ImageSettings::default());
    }

    #[test]
    fn test_data_and_extra_keys() {
        let dir = TempDir::new().unwrap();
        write_override(
            &dir,
            r#"
banner = "hello"

[data]
title = "Home"
menus = ["Blog", "About"]
"#,
        );

        let config = resolve(Config::default(), dir.path());
        assert_eq!(config.data["title"].as_str(), Some("Home"));
        assert_eq!(config.data["menus"].as_array().map(Vec::len), Some(2));
        assert_eq!(config.extra["banner"].as_str(), Some("hello"));
        assert_eq!(config.build, BuildSectionConfig::default());
    }

    #[test]
    fn test_serve_override_replaces_section() {
        let dir = TempDir::new().unwrap();
        write_override(&dir, "[serve]\nport = 4000\n");

        let config = resolve(Config::default(), dir.path());
        assert_eq!(config.serve.port, 4000);
        // the replaced table no longer carries routes; missing fields default
        assert_eq!(config.serve.routes, ServeConfig::default().routes);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write_override(&dir, "[build]\ndist = \"public_html\"\n");

        let first = resolve(Config::default(), dir.path());
        let second = resolve(Config::default(), dir.path());
        assert_eq!(first, second);
        assert_eq!(first.dist_dir(), dir.path().join("public_html"));
    }

    #[test]
    fn test_directory_helpers() {
        let config = Config::default().with_root(Path::new("/site"));
        assert_eq!(config.src_dir(), PathBuf::from("/site/src"));
        assert_eq!(config.dist_dir(), PathBuf::from("/site/dist"));
        assert_eq!(config.temp_dir(), PathBuf::from("/site/temp"));
        assert_eq!(config.public_dir(), PathBuf::from("/site/public"));
        assert_eq!(
            config.root_relative("/site/src/index.html"),
            PathBuf::from("src/index.html")
        );
    }
}
