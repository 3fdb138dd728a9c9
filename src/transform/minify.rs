//! Output minification for JS, CSS and HTML.
//!
//! Uses oxc for JavaScript, lightningcss for CSS and minify-html for pages.

use anyhow::{Result, anyhow};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::{Transform, failure};
use crate::asset::Asset;

/// Minify JavaScript source code.
///
/// Classic scripts keep their top-level names, since concatenated bundles
/// share one global scope.
pub fn minify_js(source: &str, module: bool) -> Result<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs().with_module(module);
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(err) = ret.errors.first() {
        return Err(anyhow!("{err}"));
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Result<String> {
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| anyhow!("{e}"))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{e}"))?;
    Ok(result.code)
}

// ============================================================================
// HTML
// ============================================================================

/// Minify an HTML document with embedded `<style>`/`<script>` minified.
///
/// Whitespace collapses, comments stay, closing tags and the `<html>`/
/// `<head>` openers are kept so partial pages stay well-formed.
pub fn minify_html(source: &str) -> String {
    let mut cfg = ::minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = true;
    cfg.do_not_minify_doctype = true;
    cfg.ensure_spec_compliant_unquoted_attribute_values = true;
    cfg.minify_css = true;
    cfg.minify_js = true;
    String::from_utf8_lossy(&::minify_html::minify(source.as_bytes(), &cfg)).into_owned()
}

// ============================================================================
// Transform
// ============================================================================

/// Minifies by extension: `.js`, `.css` and `.html`. Other files pass through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Minify;

impl Minify {
    fn minify(&self, asset: Asset) -> Result<Asset> {
        let minified = match asset.extension().as_str() {
            "js" => minify_js(asset.text()?, false).map_err(|e| failure(self.name(), &asset, e))?,
            "css" => minify_css(asset.text()?).map_err(|e| failure(self.name(), &asset, e))?,
            "html" | "htm" => minify_html(asset.text()?),
            _ => return Ok(asset),
        };
        Ok(Asset::new(asset.path, minified))
    }
}

impl Transform for Minify {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn apply(&self, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        assets.into_iter().map(|a| self.minify(a)).collect()
    }
}
