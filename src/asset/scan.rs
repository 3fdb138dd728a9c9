//! Source selection by glob (pure, no side effects besides reading the tree).

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use jwalk::WalkDir;

use super::TaskError;

/// `*` never crosses `/`, and dotfiles only match an explicit leading dot.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Compile a glob, reporting the offending pattern on error.
pub fn compile(glob: &str) -> Result<Pattern, TaskError> {
    Pattern::new(glob).map_err(|e| TaskError::Glob(glob.to_string(), e))
}

/// Check whether `rel` (relative to the glob base) matches `pattern`.
pub fn matches(pattern: &Pattern, rel: &Path) -> bool {
    rel.to_str()
        .map(|s| pattern.matches_with(&s.replace('\\', "/"), MATCH_OPTIONS))
        .unwrap_or(false)
}

/// List files under `base` matching `glob`, as sorted base-relative paths.
///
/// A missing base directory selects nothing.
pub fn select(glob: &str, base: &Path) -> Result<Vec<PathBuf>, TaskError> {
    let pattern = compile(glob)?;
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(base)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.path().strip_prefix(base).ok().map(Path::to_path_buf))
        .filter(|rel| matches(&pattern, rel))
        .collect();
    files.sort();
    Ok(files)
}
