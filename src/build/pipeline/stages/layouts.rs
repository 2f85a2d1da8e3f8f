//! Layout rendering stage.
//!
//! Wraps rendered HTML pages in their layout template, with the site
//! metadata and the page's front matter in scope.

use serde_yaml::Value;

use crate::build::files::{Files, SourceFile, is_html};
use crate::build::pipeline::{PipelineContext, PipelineError, Stage};
use crate::build::render::{LayoutContext, Renderer};

/// Stage that applies layout templates to HTML entries.
///
/// The layout is the page's `layout` front matter value, or the configured
/// default. `layout: false` (or no default) leaves the page unwrapped. A
/// layout that does not exist fails the build.
pub struct LayoutsStage;

impl Stage for LayoutsStage {
    fn name(&self) -> &'static str {
        "layouts"
    }

    fn process(&self, files: &mut Files, ctx: &PipelineContext) -> Result<(), PipelineError> {
        let renderer = Renderer::new(&ctx.layouts_dir)?;
        let default = ctx.config.layouts.default.as_deref();

        for (path, file) in files.iter_mut().filter(|(p, _)| is_html(p)) {
            let Some(layout) = layout_for(file, default).map_err(|message| {
                PipelineError::stage("layouts", format!("{}: {}", path.display(), message))
            })?
            else {
                continue;
            };

            let html = {
                let contents = file.text().ok_or_else(|| {
                    PipelineError::stage(
                        "layouts",
                        format!("{} is not valid UTF-8", path.display()),
                    )
                })?;
                renderer
                    .render_layout(
                        &layout,
                        &LayoutContext {
                            metadata: ctx.metadata(),
                            front_matter: &file.front_matter,
                            contents,
                        },
                    )
                    .map_err(|e| {
                        PipelineError::stage("layouts", format!("{}: {}", path.display(), e))
                    })?
            };
            file.contents = html.into_bytes();
        }

        Ok(())
    }
}

/// Pick the layout for a page.
fn layout_for(file: &SourceFile, default: Option<&str>) -> Result<Option<String>, String> {
    match file.front_matter.get("layout") {
        Some(Value::String(name)) => Ok(Some(name.clone())),
        Some(Value::Bool(false)) => Ok(None),
        Some(Value::Null) | None => Ok(default.map(str::to_string)),
        Some(_) => Err("`layout` must be a template name or false".to_string()),
    }
}
