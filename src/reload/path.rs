//! URL to filesystem path resolution across routes and serving roots.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Directories a URL may resolve into, in priority order.
#[derive(Debug, Clone, Default)]
pub struct ServeRoots {
    /// URL prefix (without slashes) mapped to a directory, checked first
    pub routes: Vec<(String, PathBuf)>,
    /// Directories searched in order for every other URL
    pub roots: Vec<PathBuf>,
}

impl ServeRoots {
    /// First existing file for `url`, routes before roots.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let clean = normalize_url(url);

        // Reject paths with suspicious patterns early
        if clean.split('/').any(|segment| segment == "..") {
            return None;
        }

        let routed = self.routes.iter().find_map(|(prefix, dir)| {
            let rest = match clean.strip_prefix(prefix.as_str()) {
                Some("") => "",
                Some(rest) => rest.strip_prefix('/')?,
                None => return None,
            };
            resolve_path(rest, dir)
        });

        routed.or_else(|| {
            self.roots
                .iter()
                .find_map(|root| resolve_path(&clean, root))
        })
    }
}

/// Resolve a relative URL path under one root, handling index.html for directories
pub fn resolve_path(clean: &str, serve_root: &Path) -> Option<PathBuf> {
    let local = serve_root.join(clean);

    // Canonicalize to resolve symlinks and verify path is under serve_root
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        // Path escapes serve_root - reject
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Normalize URL: decode, strip query string and fragment, trim slashes
pub fn normalize_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();
    decoded.trim_matches('/').to_string()
}
