//! Reference block rewriting for compiled pages.
//!
//! A reference block names a bundle and lists the files that make it up:
//!
//! ```html
//! <!-- build:css assets/styles/main.css -->
//! <link rel="stylesheet" href="assets/styles/a.css">
//! <link rel="stylesheet" href="/node_modules/reset.css">
//! <!-- endbuild -->
//! ```
//!
//! The block collapses to a single tag pointing at the bundle, and the
//! bundle is emitted as a new asset holding the referenced files joined in
//! order. `build:js` works the same with `<script src>`, `build:remove`
//! drops the block. Referenced files are looked up in the alternate search
//! paths of the block (`build:css(app,.tmp) ...`) and then in
//! [`UserefOptions::search_path`], first hit wins.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use rustc_hash::FxHashSet;

use super::{Transform, failure};
use crate::asset::Asset;
use crate::utils::html::{escape_attr, parse_attributes};

static BLOCK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*build:(\w+)(?:\(([^)]*)\))?(?:\s+(\S+?))?\s*-->").unwrap()
});

static BLOCK_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!--\s*endbuild\s*-->").unwrap());

/// `<link ...>` or `<script ...>` start tags inside a block.
static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(link|script)\b([^>]*)>").unwrap());

/// Reference resolution settings.
#[derive(Debug, Clone, Default)]
pub struct UserefOptions {
    /// Directories searched in order for referenced files.
    pub search_path: Vec<PathBuf>,
    /// Directory alternate search paths of a block are relative to.
    pub root: PathBuf,
}

/// Collapses reference blocks in `.html` assets and emits their bundles.
pub struct Useref {
    options: UserefOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Css,
    Js,
    Remove,
}

impl BlockKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "css" => Some(Self::Css),
            "js" => Some(Self::Js),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }
}

impl Useref {
    pub fn new(options: UserefOptions) -> Self {
        Self { options }
    }

    /// Rewrite one page. Returns the new HTML and the bundles it references.
    fn process(&self, page: &Path, html: &str) -> Result<(String, Vec<Asset>), String> {
        let page_dir = page.parent().unwrap_or(Path::new(""));
        let mut out = String::with_capacity(html.len());
        let mut bundles = Vec::new();
        let mut rest = html;

        while let Some(start) = BLOCK_START.captures(rest) {
            let whole = start.get(0).map_or(0..0, |m| m.range());
            let end = BLOCK_END
                .find(&rest[whole.end..])
                .ok_or_else(|| format!("unterminated `{}`", &rest[whole.clone()]))?;
            let body = &rest[whole.end..whole.end + end.start()];

            out.push_str(&rest[..whole.start]);
            rest = &rest[whole.end + end.end()..];

            let ty = &start[1];
            let Some(kind) = BlockKind::parse(ty) else {
                // unknown block types keep their content
                out.push_str(body);
                continue;
            };
            if kind == BlockKind::Remove {
                continue;
            }

            let target = start
                .get(3)
                .map(|m| m.as_str())
                .ok_or_else(|| format!("`build:{ty}` block without a target"))?;
            let alternates = start.get(2).map_or("", |m| m.as_str());

            let mut bundle = Vec::new();
            for reference in references(kind, body) {
                let file = self
                    .locate(page_dir, &reference, alternates)
                    .ok_or_else(|| format!("cannot find `{reference}`"))?;
                let contents =
                    fs::read(&file).map_err(|e| format!("cannot read {}: {e}", file.display()))?;
                if !bundle.is_empty() {
                    bundle.push(b'\n');
                }
                bundle.extend_from_slice(&contents);
            }

            let href = escape_attr(target);
            match kind {
                BlockKind::Css => out.push_str(&format!(r#"<link rel="stylesheet" href="{href}">"#)),
                _ => out.push_str(&format!(r#"<script src="{href}"></script>"#)),
            }
            bundles.push(Asset::new(output_path(page_dir, target), bundle));
        }

        out.push_str(rest);
        Ok((out, bundles))
    }

    /// First existing file for `reference` across the search path.
    fn locate(&self, page_dir: &Path, reference: &str, alternates: &str) -> Option<PathBuf> {
        let rel = output_path(page_dir, reference);
        alternates
            .split(',')
            .map(|alt| alt.trim().trim_matches(|c: char| c == '{' || c == '}'))
            .filter(|alt| !alt.is_empty())
            .map(|alt| self.options.root.join(alt))
            .chain(self.options.search_path.iter().cloned())
            .map(|dir| dir.join(&rel))
            .find(|candidate| candidate.is_file())
    }
}

/// `href`/`src` of every reference tag of the block's kind.
fn references(kind: BlockKind, body: &str) -> Vec<String> {
    let (tag, attr) = match kind {
        BlockKind::Css => ("link", "href"),
        _ => ("script", "src"),
    };
    REFERENCE
        .captures_iter(body)
        .filter(|caps| caps[1].eq_ignore_ascii_case(tag))
        .filter_map(|caps| {
            parse_attributes(&caps[2])
                .into_iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(attr))
                .map(|(_, value)| value)
        })
        .collect()
}

/// Resolve a URL against the page directory into a normalized relative path.
///
/// A leading `/` is relative to the site root; query and fragment are dropped.
fn output_path(page_dir: &Path, url: &str) -> PathBuf {
    let url = url.split(['?', '#']).next().unwrap_or(url);
    let joined = match url.strip_prefix('/') {
        Some(abs) => PathBuf::from(abs),
        None => page_dir.join(url),
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
            _ => {}
        }
    }
    normalized
}

impl Transform for Useref {
    fn name(&self) -> &'static str {
        "useref"
    }

    fn apply(&self, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        let mut output = Vec::with_capacity(assets.len());
        let mut emitted = FxHashSet::default();

        for asset in assets {
            if !matches!(asset.extension().as_str(), "html" | "htm") {
                output.push(asset);
                continue;
            }

            let (html, bundles) = self
                .process(&asset.path, asset.text()?)
                .map_err(|e| failure(self.name(), &asset, e))?;
            output.push(Asset::new(asset.path, html));
            // pages sharing a bundle emit it once
            output.extend(bundles.into_iter().filter(|b| emitted.insert(b.path.clone())));
        }

        Ok(output)
    }
}
