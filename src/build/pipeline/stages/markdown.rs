//! Markdown rendering stage.

use std::path::PathBuf;

use crate::build::files::{Files, has_extension};
use crate::build::markdown::{MARKDOWN_EXTENSIONS, parser_options, render_markdown};
use crate::build::pipeline::{PipelineContext, PipelineError, Stage};

/// Stage that renders markdown entries to HTML.
///
/// After this stage every markdown entry has been re-keyed with an `.html`
/// extension and holds an HTML fragment; its front matter is kept for the
/// permalink and layout stages. Other entries are untouched.
pub struct MarkdownStage;

impl Stage for MarkdownStage {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn process(&self, files: &mut Files, ctx: &PipelineContext) -> Result<(), PipelineError> {
        let options = parser_options(&ctx.config.markdown)?;

        let sources: Vec<PathBuf> = files
            .keys()
            .filter(|p| has_extension(p, MARKDOWN_EXTENSIONS))
            .cloned()
            .collect();

        for path in sources {
            let Some(mut file) = files.remove(&path) else {
                continue;
            };

            let html = {
                let text = file.text().ok_or_else(|| {
                    PipelineError::stage(
                        "markdown",
                        format!("{} is not valid UTF-8", path.display()),
                    )
                })?;
                render_markdown(text, options)
            };
            file.contents = html.into_bytes();

            let output = path.with_extension("html");
            if files.contains_key(&output) {
                tracing::warn!(
                    "{} replaces existing {}",
                    path.display(),
                    output.display()
                );
            }
            files.insert(output, file);
        }

        Ok(())
    }
}
