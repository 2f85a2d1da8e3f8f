//! Build pipeline for the file collection.
//!
//! The pipeline transforms the collection through a series of stages:
//! 1. Styles (stylesheet sources to CSS)
//! 2. Markdown (to HTML fragments)
//! 3. Permalinks (pretty `<slug>/index.html` paths)
//! 4. Layouts (page templates wrapped around the fragments)
//!
//! In watch mode a live reload stage is appended so served pages reconnect
//! to the dev server. Stages run strictly in order; the first error aborts
//! the run and nothing is written.

mod context;
mod error;
mod stages;

pub use context::PipelineContext;
pub use error::PipelineError;
pub use stages::{LayoutsStage, LiveReloadStage, MarkdownStage, PermalinksStage, StylesStage};
pub use stages::LIVE_RELOAD_PATH;

use super::files::Files;

/// A stage in the file processing pipeline.
///
/// Stages transform the collection sequentially. Each stage receives the
/// whole collection and may modify, add, move or remove entries in place
/// before it is passed to the next stage.
pub trait Stage: Send + Sync {
    /// Unique name for this stage (used in errors and logs).
    fn name(&self) -> &'static str;

    /// Process the collection through this stage.
    fn process(&self, files: &mut Files, ctx: &PipelineContext) -> Result<(), PipelineError>;
}

/// The file processing pipeline.
///
/// The default pipeline is: styles → markdown → permalinks → layouts.
/// Markdown must run before permalinks (which only move `.html` entries),
/// and permalinks before layouts (so templates see the final `path`).
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Create an empty pipeline with no stages.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Create the default pipeline with standard stages.
    pub fn default_pipeline() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(StylesStage);
        pipeline.add_stage(MarkdownStage);
        pipeline.add_stage(PermalinksStage);
        pipeline.add_stage(LayoutsStage);
        pipeline
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Run the pipeline on a collection.
    pub fn run(&self, files: &mut Files, ctx: &PipelineContext) -> Result<(), PipelineError> {
        for stage in &self.stages {
            tracing::debug!(stage = stage.name(), files = files.len(), "running stage");
            stage.process(files, ctx)?;
        }
        Ok(())
    }

    /// Get the names of all stages in order.
    #[cfg(test)]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::build::files::SourceFile;
    use crate::config::SiteConfig;

    struct Upper;

    impl Stage for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn process(&self, files: &mut Files, _ctx: &PipelineContext) -> Result<(), PipelineError> {
            for file in files.values_mut() {
                file.contents.make_ascii_uppercase();
            }
            Ok(())
        }
    }

    struct Fail;

    impl Stage for Fail {
        fn name(&self) -> &'static str {
            "fail"
        }

        fn process(&self, _files: &mut Files, _ctx: &PipelineContext) -> Result<(), PipelineError> {
            Err(PipelineError::stage("fail", "boom"))
        }
    }

    #[test]
    fn test_default_order() {
        assert_eq!(
            Pipeline::default().stage_names(),
            vec!["styles", "markdown", "permalinks", "layouts"]
        );
    }

    #[test]
    fn test_stages_run_in_order_and_stop_on_error() {
        let config = SiteConfig::default();
        let ctx = PipelineContext::new(&config, Path::new("/site"));
        let mut files = Files::new();
        files.insert(PathBuf::from("a.txt"), SourceFile::new("abc"));

        let mut pipeline = Pipeline::new();
        pipeline.add_stage(Upper).add_stage(Fail).add_stage(Upper);

        let err = pipeline.run(&mut files, &ctx).unwrap_err();
        assert_eq!(err.to_string(), "stage 'fail' failed: boom");
        assert_eq!(files[Path::new("a.txt")].contents, b"ABC");
    }
}
