//! JavaScript syntax lowering via the oxc transformer.

use std::path::Path;

use anyhow::Result;
use oxc::allocator::Allocator;
use oxc::codegen::Codegen;
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{TransformOptions, Transformer};

use super::{Transform, failure};
use crate::asset::Asset;

/// Transpiler settings.
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    /// Lowest syntax level to emit, in browserslist-like form.
    pub target: String,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            target: "es2015".into(),
        }
    }
}

/// Lowers newer syntax (`??`, `?.`, class fields, ...) to the target.
pub struct ScriptTransform {
    options: TransformOptions,
}

impl ScriptTransform {
    pub fn new(options: &ScriptOptions) -> Result<Self> {
        let options = TransformOptions::from_target(&options.target)
            .map_err(|e| anyhow::anyhow!("invalid script target `{}`: {}", options.target, e))?;
        Ok(Self { options })
    }

    fn lower(&self, path: &Path, source: &str) -> Result<String, String> {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs());

        let ret = Parser::new(&allocator, source, source_type).parse();
        if let Some(err) = ret.errors.first() {
            return Err(err.to_string());
        }
        let mut program = ret.program;

        let scoping = SemanticBuilder::new()
            .build(&program)
            .semantic
            .into_scoping();
        let ret = Transformer::new(&allocator, path, &self.options)
            .build_with_scoping(scoping, &mut program);
        if let Some(err) = ret.errors.first() {
            return Err(err.to_string());
        }

        Ok(Codegen::new().build(&program).code)
    }
}

impl Transform for ScriptTransform {
    fn name(&self) -> &'static str {
        "script"
    }

    fn apply(&self, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        assets
            .into_iter()
            .map(|asset| {
                let code = self
                    .lower(&asset.path, asset.text()?)
                    .map_err(|e| failure(self.name(), &asset, e))?;
                Ok(Asset::new(asset.path, code))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> ScriptTransform {
        ScriptTransform::new(&ScriptOptions::default()).unwrap()
    }

    #[test]
    fn test_lowers_modern_syntax() {
        let out = transform()
            .apply(vec![Asset::new(
                "assets/scripts/b.js",
                "const v = a ?? b;\nconst w = o?.p;\n",
            )])
            .unwrap();

        let code = out[0].text().unwrap();
        assert!(!code.contains("??"), "{code}");
        assert!(!code.contains("?."), "{code}");
    }

    #[test]
    fn test_keeps_path() {
        let out = transform()
            .apply(vec![Asset::new("assets/scripts/b.js", "console.log(1);")])
            .unwrap();
        assert_eq!(out[0].path, Path::new("assets/scripts/b.js"));
        assert!(out[0].text().unwrap().contains("console.log(1)"));
    }

    #[test]
    fn test_syntax_error_names_file() {
        let err = transform()
            .apply(vec![Asset::new("bad.js", "function (")])
            .unwrap_err();
        assert!(err.to_string().starts_with("script failed on bad.js"));
    }

    #[test]
    fn test_invalid_target() {
        let options = ScriptOptions {
            target: "netscape4".into(),
        };
        assert!(ScriptTransform::new(&options).is_err());
    }
}
