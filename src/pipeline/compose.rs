//! Pipeline composition.
//!
//! Every graph is built once from the resolved configuration; nothing is
//! rewired at run time.

use std::sync::Arc;

use anyhow::Result;
use rustc_hash::FxHashMap;

use super::{CleanTask, Pipeline, PostProcess, Task};
use crate::asset::AssetTask;
use crate::config::Config;
use crate::core::AssetKind;
use crate::reload::LiveReload;
use crate::transform::{
    Identity, ImageOptions, ImageTransform, PageOptions, PageTransform, ScriptOptions,
    ScriptTransform, StyleOptions, StyleTransform, Transform,
};
use crate::watch::{DevServer, WatchAction, WatchBinding};

/// One transform per asset class.
pub struct Transforms {
    by_kind: FxHashMap<AssetKind, Arc<dyn Transform>>,
}

impl Transforms {
    /// The production transforms, configured from `config`.
    pub fn standard(config: &Config) -> Result<Self> {
        let src = config.src_dir();
        let images: Arc<dyn Transform> = Arc::new(ImageTransform::new(ImageOptions {
            jpeg_quality: config.build.images.jpeg_quality,
        }));
        let pages = PageOptions {
            data: config.data.clone(),
        };

        Ok(Self::identity()
            .with(
                AssetKind::Styles,
                Arc::new(StyleTransform::new(src.clone(), StyleOptions::default())),
            )
            .with(
                AssetKind::Scripts,
                Arc::new(ScriptTransform::new(&ScriptOptions::default())?),
            )
            .with(AssetKind::Pages, Arc::new(PageTransform::new(src, pages)))
            .with(AssetKind::Images, Arc::clone(&images))
            .with(AssetKind::Fonts, images))
    }

    /// Copy every asset unchanged.
    pub fn identity() -> Self {
        let by_kind = AssetKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(Identity) as Arc<dyn Transform>))
            .collect();
        Self { by_kind }
    }

    /// Replace the transform of one asset class.
    pub fn with(mut self, kind: AssetKind, transform: Arc<dyn Transform>) -> Self {
        self.by_kind.insert(kind, transform);
        self
    }

    fn get(&self, kind: AssetKind) -> Arc<dyn Transform> {
        self.by_kind
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::new(Identity))
    }
}

/// The named pipelines and every individually runnable task.
pub struct Pipelines {
    tasks: FxHashMap<&'static str, Arc<dyn Task>>,
    clean: Pipeline,
    compile: Pipeline,
    build: Pipeline,
    develop: Pipeline,
}

impl Pipelines {
    pub fn new(config: Arc<Config>, transforms: Transforms, reload: Arc<dyn LiveReload>) -> Self {
        let mut tasks: FxHashMap<&'static str, Arc<dyn Task>> = FxHashMap::default();
        let mut bindings = Vec::new();

        for kind in AssetKind::ALL {
            let task = Arc::new(
                AssetTask::new(kind, &config, transforms.get(kind)).with_reload(Arc::clone(&reload)),
            );
            let action = if kind.is_intermediate() {
                WatchAction::Run(Arc::clone(&task) as Arc<dyn Task>)
            } else {
                WatchAction::Reload
            };
            bindings.push(WatchBinding::new(task.glob(), task.base(), action));
            tasks.insert(kind.task_name(), task);
        }

        tasks.insert("clean", Arc::new(CleanTask::new(&config)));
        tasks.insert("useref", Arc::new(PostProcess::new(&config)));
        tasks.insert(
            "serve",
            Arc::new(DevServer::new(Arc::clone(&config), bindings, reload)),
        );

        let task = |name: &str| Pipeline::Task(Arc::clone(&tasks[name]));

        let clean = task("clean");
        let compile = Pipeline::Parallel(vec![task("style"), task("script"), task("page")]);
        let build = Pipeline::Sequential(vec![
            clean.clone(),
            Pipeline::Parallel(vec![Pipeline::Sequential(vec![
                compile.clone(),
                task("useref"),
            ])]),
        ]);
        let develop = Pipeline::Sequential(vec![compile.clone(), task("serve")]);

        Self {
            tasks,
            clean,
            compile,
            build,
            develop,
        }
    }

    pub fn clean(&self) -> &Pipeline {
        &self.clean
    }

    pub fn compile(&self) -> &Pipeline {
        &self.compile
    }

    pub fn build(&self) -> &Pipeline {
        &self.build
    }

    pub fn develop(&self) -> &Pipeline {
        &self.develop
    }

    /// Look up a composed pipeline or a single task by name.
    pub fn get(&self, name: &str) -> Option<Pipeline> {
        match name {
            "compile" => Some(self.compile.clone()),
            "build" => Some(self.build.clone()),
            "develop" => Some(self.develop.clone()),
            _ => self.tasks.get(name).cloned().map(Pipeline::Task),
        }
    }

    /// Every name [`Pipelines::get`] accepts, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.tasks.keys().copied().collect();
        names.extend(["compile", "build", "develop"]);
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::ReloadServer;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn pipelines(root: &Path, transforms: Transforms) -> (Arc<Config>, Pipelines) {
        let config = Arc::new(Config::default().with_root(root));
        let pipelines = Pipelines::new(
            Arc::clone(&config),
            transforms,
            Arc::new(ReloadServer::new()),
        );
        (config, pipelines)
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn files_under(dir: &Path) -> Vec<String> {
        let mut files: Vec<String> = jwalk::WalkDir::new(dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                e.path()
                    .strip_prefix(dir)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        files.sort();
        files
    }

    fn noisy_jpeg() -> Vec<u8> {
        use image::codecs::jpeg::JpegEncoder;
        use image::{DynamicImage, Rgb, RgbImage};

        let img = RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 37 % 251) as u8, (y * 53 % 241) as u8, ((x ^ y) * 7) as u8])
        });
        let mut out = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_with_encoder(JpegEncoder::new_with_quality(&mut out, 100))
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_jpeg_quality_reaches_image_transform() {
        let input = noisy_jpeg();
        let asset = || vec![crate::asset::Asset::new("assets/images/photo.jpg", input.clone())];

        let untouched = Transforms::standard(&Config::default())
            .unwrap()
            .get(AssetKind::Images)
            .apply(asset())
            .unwrap();
        assert_eq!(untouched[0].contents, input);

        let mut config = Config::default();
        config.build.images.jpeg_quality = Some(40);
        let recompressed = Transforms::standard(&config)
            .unwrap()
            .get(AssetKind::Images)
            .apply(asset())
            .unwrap();
        assert!(recompressed[0].contents.len() < input.len());
        assert!(image::load_from_memory(&recompressed[0].contents).is_ok());
    }

    #[test]
    fn test_describe_graphs() {
        let dir = TempDir::new().unwrap();
        let (_, pipelines) = pipelines(dir.path(), Transforms::identity());

        assert_eq!(
            pipelines.compile().describe(),
            "parallel(style, script, page)"
        );
        assert_eq!(
            pipelines.build().describe(),
            "series(clean, parallel(series(parallel(style, script, page), useref)))"
        );
        assert_eq!(
            pipelines.develop().describe(),
            "series(parallel(style, script, page), serve)"
        );
        assert_eq!(pipelines.clean().describe(), "clean");
    }

    #[test]
    fn test_every_task_addressable() {
        let dir = TempDir::new().unwrap();
        let (_, pipelines) = pipelines(dir.path(), Transforms::identity());

        for name in [
            "style", "script", "page", "image", "font", "extra", "useref", "clean", "compile",
            "build", "develop",
        ] {
            assert!(pipelines.get(name).is_some(), "{name}");
        }
        assert!(pipelines.get("deploy").is_none());
        assert!(pipelines.names().contains(&"serve"));
    }

    #[test]
    fn test_compile_yields_three_files_in_temp() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/assets/styles/main.scss", "a {}");
        write(dir.path(), "src/assets/scripts/app.js", "let a;");
        write(dir.path(), "src/index.html", "<p></p>");
        write(dir.path(), "src/assets/images/logo.png", "not really");

        let (config, pipelines) = pipelines(dir.path(), Transforms::identity());
        pipelines.compile().run().unwrap();

        assert_eq!(
            files_under(&config.temp_dir()),
            [
                "assets/scripts/app.js",
                "assets/styles/main.scss",
                "index.html"
            ]
        );
        assert!(!config.dist_dir().exists());
    }

    #[test]
    fn test_clean_twice_succeeds() {
        let dir = TempDir::new().unwrap();
        let (config, pipelines) = pipelines(dir.path(), Transforms::identity());

        pipelines.clean().run().unwrap();
        pipelines.clean().run().unwrap();
        assert!(!config.dist_dir().exists());
    }

    #[test]
    fn test_failing_task_aborts_build() {
        struct Broken;
        impl Transform for Broken {
            fn name(&self) -> &'static str {
                "broken"
            }
            fn apply(&self, _: Vec<crate::asset::Asset>) -> Result<Vec<crate::asset::Asset>> {
                anyhow::bail!("nope")
            }
        }

        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/assets/scripts/app.js", "let a;");
        write(dir.path(), "src/index.html", "<p></p>");

        let transforms = Transforms::identity().with(AssetKind::Scripts, Arc::new(Broken));
        let (config, pipelines) = pipelines(dir.path(), transforms);

        let err = pipelines.build().run().unwrap_err();
        assert_eq!(err.to_string(), "task `script` failed");
        // useref never ran
        assert!(!config.dist_dir().join("index.html").exists());
    }

    #[test]
    fn test_build_end_to_end() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/assets/styles/a.scss", "$c: red;\nbody {\n  color: $c;\n}\n");
        write(
            root,
            "src/assets/scripts/b.js",
            "const greet = (name) => {\n  return `hi ${name}`;\n};\nconsole.log(greet('x'));\n",
        );
        write(
            root,
            "src/index.html",
            r#"<!DOCTYPE html>
<html>
  <head>
    <title>{{ title }}</title>
    <!-- build:css assets/styles/a.css -->
    <link rel="stylesheet" href="assets/styles/a.css">
    <!-- endbuild -->
  </head>
  <body>
    <h1>{{ title }}</h1>
    <!-- build:js assets/scripts/b.js -->
    <script src="assets/scripts/b.js"></script>
    <!-- endbuild -->
  </body>
</html>
"#,
        );
        write(root, "pages.toml", "[data]\ntitle = \"Home\"\n");

        let config = Arc::new(crate::config::resolve(Config::default(), root));
        let transforms = Transforms::standard(&config).unwrap();
        let pipelines = Pipelines::new(
            Arc::clone(&config),
            transforms,
            Arc::new(ReloadServer::new()),
        );
        pipelines.build().run().unwrap();

        let dist = config.dist_dir();
        let html = fs::read_to_string(dist.join("index.html")).unwrap();
        assert_eq!(html.matches("<link").count(), 1, "{html}");
        assert!(html.contains("assets/styles/a.css"), "{html}");
        assert_eq!(html.matches("<script").count(), 1, "{html}");
        assert!(html.contains("assets/scripts/b.js"), "{html}");
        assert!(html.contains("<h1>Home</h1>"), "{html}");
        assert!(!html.contains("build:"), "{html}");
        assert!(!html.contains("endbuild"), "{html}");

        let css = fs::read_to_string(dist.join("assets/styles/a.css")).unwrap();
        assert_eq!(css, "body{color:red}");

        let js = fs::read_to_string(dist.join("assets/scripts/b.js")).unwrap();
        assert!(js.contains("console.log"), "{js}");
        assert!(!js.contains("\n  "), "{js}");

        // the expanded intermediate stays in temp
        let compiled = fs::read_to_string(config.temp_dir().join("assets/styles/a.css")).unwrap();
        assert!(compiled.contains("color: red"), "{compiled}");
    }
}
