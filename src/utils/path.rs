//! Path normalization utilities.

use std::path::{Path, PathBuf};

/// Normalize a file system path to its canonical form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`). A path that
/// no longer exists (removed file) canonicalizes its parent and re-appends
/// the file name, so watcher events compare equal to canonical bases.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            normalize_path(parent).join(name)
        }
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_existing_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "").unwrap();

        let normalized = normalize_path(&dir.path().join("./a.txt"));
        assert_eq!(normalized, file.canonicalize().unwrap());
    }

    #[test]
    fn test_normalize_removed_path() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("sub/gone.scss");

        let normalized = normalize_path(&gone);
        assert_eq!(
            normalized,
            dir.path().canonicalize().unwrap().join("sub/gone.scss")
        );
    }
}
