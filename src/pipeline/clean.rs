//! Cleanup task: remove output directories.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Result;
use rayon::prelude::*;

use super::Task;
use crate::asset::TaskError;
use crate::config::Config;

/// Remove every path (file or directory tree). Missing paths are fine.
pub fn remove_all(paths: &[PathBuf]) -> Result<(), TaskError> {
    paths.par_iter().try_for_each(|path| {
        let result = match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
            Ok(_) => fs::remove_file(path),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TaskError::Io(path.clone(), e)),
        }
    })
}

/// Removes `dist` and `temp`.
pub struct CleanTask {
    paths: Vec<PathBuf>,
}

impl CleanTask {
    pub fn new(config: &Config) -> Self {
        Self {
            paths: vec![config.dist_dir(), config.temp_dir()],
        }
    }
}

impl Task for CleanTask {
    fn name(&self) -> &str {
        "clean"
    }

    fn run(&self) -> Result<()> {
        remove_all(&self.paths)?;
        Ok(())
    }
}
