//! Stylesheet compilation stage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::build::files::{Files, SourceFile, has_extension};
use crate::build::pipeline::{PipelineContext, PipelineError, Stage};
use crate::build::styles::{STYLE_EXTENSIONS, StyleCompiler, is_partial};

/// Stage that compiles stylesheet sources to CSS.
///
/// Every `.scss`/`.sass` entry is removed from the collection. Partials
/// (`_name.scss`) produce nothing; every other source is compiled and
/// inserted as `<output_dir>/<stem>.css`.
pub struct StylesStage;

impl Stage for StylesStage {
    fn name(&self) -> &'static str {
        "styles"
    }

    fn process(&self, files: &mut Files, ctx: &PipelineContext) -> Result<(), PipelineError> {
        let styles = &ctx.config.styles;
        let compiler = StyleCompiler::new(styles.output_style, ctx.include_paths.clone());

        let sources: Vec<PathBuf> = files
            .keys()
            .filter(|p| has_extension(p, STYLE_EXTENSIONS))
            .cloned()
            .collect();

        // output path -> source it came from
        let mut compiled: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

        for path in sources {
            let Some(file) = files.remove(&path) else {
                continue;
            };
            if is_partial(&path) {
                continue;
            }

            let text = file.text().ok_or_else(|| {
                PipelineError::stage("styles", format!("{} is not valid UTF-8", path.display()))
            })?;

            // Imports resolve next to the source file on disk
            let dir = ctx
                .source_dir
                .join(path.parent().unwrap_or(Path::new("")));
            let css = compiler.compile(text, &path, &dir).map_err(|e| {
                PipelineError::stage(
                    "styles",
                    format!("failed to compile {}: {}", path.display(), e),
                )
            })?;

            let stem = path.file_stem().unwrap_or_default().to_string_lossy();
            let output = styles.output_dir.join(format!("{stem}.css"));

            if let Some(previous) = compiled.get(&output) {
                return Err(PipelineError::stage(
                    "styles",
                    format!(
                        "{} and {} both compile to {}",
                        previous.display(),
                        path.display(),
                        output.display()
                    ),
                ));
            }
            if files.contains_key(&output) {
                return Err(PipelineError::stage(
                    "styles",
                    format!(
                        "{} and {} both produce {}",
                        output.display(),
                        path.display(),
                        output.display()
                    ),
                ));
            }

            tracing::debug!("compiled {} -> {}", path.display(), output.display());
            files.insert(
                output.clone(),
                SourceFile {
                    contents: css.into_bytes(),
                    front_matter: file.front_matter,
                },
            );
            compiled.insert(output, path);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::build::pipeline::stages::test_support::{files, paths, text};
    use crate::config::{OutputStyle, SiteConfig};

    #[test]
    fn test_compiles_into_output_dir() {
        let config = SiteConfig::default();
        let ctx = PipelineContext::new(&config, Path::new("/nonexistent"));
        let mut files = files(&[
            ("styles/main.scss", "a { b { color: red; } }"),
            ("css/_vars.scss", "$x: 1;"),
            ("index.md", "# hi"),
        ]);

        StylesStage.process(&mut files, &ctx).unwrap();

        assert_eq!(paths(&files), vec!["css/main.css", "index.md"]);
        assert!(text(&files, "css/main.css").contains("a b {"));
    }

    #[test]
    fn test_compressed_output() {
        let mut config = SiteConfig::default();
        config.styles.output_style = OutputStyle::Compressed;
        config.styles.output_dir = "assets/css".into();
        let ctx = PipelineContext::new(&config, Path::new("/nonexistent"));
        let mut files = files(&[("main.scss", "a { color: red; }")]);

        StylesStage.process(&mut files, &ctx).unwrap();

        assert_eq!(text(&files, "assets/css/main.css").trim(), "a{color:red}");
    }

    #[test]
    fn test_compile_error_names_file() {
        let config = SiteConfig::default();
        let ctx = PipelineContext::new(&config, Path::new("/nonexistent"));
        let mut files = files(&[("css/broken.scss", "a { color: $nope; }")]);

        let err = StylesStage.process(&mut files, &ctx).unwrap_err();
        assert!(err.to_string().contains("css/broken.scss"));
    }

    #[test]
    fn test_output_clash() {
        let config = SiteConfig::default();
        let ctx = PipelineContext::new(&config, Path::new("/nonexistent"));
        let mut files = files(&[("a/main.scss", "a{}"), ("b/main.scss", "b{}")]);

        let err = StylesStage.process(&mut files, &ctx).unwrap_err();
        assert!(err.to_string().contains("both compile to"));
    }

    #[test]
    fn test_existing_css_not_overwritten() {
        let config = SiteConfig::default();
        let ctx = PipelineContext::new(&config, Path::new("/nonexistent"));
        let mut files = files(&[("css/main.css", "a { b: c; }"), ("css/main.scss", "d{e:f}")]);

        let err = StylesStage.process(&mut files, &ctx).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("css/main.scss"));
        assert!(message.contains("both produce css/main.css"));
    }
}
