use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, SiteConfig};

use super::files::Files;
use super::globs::GlobSet;
use super::pipeline::{LiveReloadStage, Pipeline, PipelineContext, PipelineError};
use super::source::{Source, SourceError};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("failed to clean {path}: {source}")]
    Clean {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What a build run should read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildScope {
    /// Clean (if configured), read the whole source tree, write everything.
    Full,
    /// Read just these source-relative paths and write their outputs over
    /// the existing destination.
    Paths(BTreeSet<PathBuf>),
}

#[derive(Debug)]
pub struct BuildResult {
    pub output_dir: PathBuf,
    pub files: usize,
}

/// Runs the pipeline end to end: clean, read, transform, write.
pub struct Builder {
    config: SiteConfig,
    /// Base path for resolving relative paths (typically the config file's directory)
    base_path: PathBuf,
    pipeline: Pipeline,
}

impl Builder {
    pub fn new(config: SiteConfig, base_path: PathBuf) -> Self {
        Self {
            config,
            base_path,
            pipeline: Pipeline::default_pipeline(),
        }
    }

    /// Inject the live reload client into every page.
    pub fn with_live_reload(mut self, live_reload: bool) -> Self {
        if live_reload {
            self.pipeline.add_stage(LiveReloadStage);
        }
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the output directory path, resolved against base_path.
    pub fn output_dir(&self) -> PathBuf {
        self.config.destination_dir(&self.base_path)
    }

    /// Get the source directory path, resolved against base_path.
    pub fn source_dir(&self) -> PathBuf {
        self.config.source_dir(&self.base_path)
    }

    /// Build the whole site.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        self.rebuild(&RebuildScope::Full)
    }

    /// Build the given scope.
    ///
    /// Build pipeline:
    /// 1. Validate the directory layout, check the source exists
    /// 2. Clean the destination (full builds with `clean` set)
    /// 3. Read the source tree (or the selected paths) into a collection
    /// 4. Run every stage over the collection
    /// 5. Write the collection to the destination
    ///
    /// Nothing is written unless every stage succeeds.
    pub fn rebuild(&self, scope: &RebuildScope) -> Result<BuildResult, BuildError> {
        self.config.validate(&self.base_path)?;

        let source_dir = self.source_dir();
        let output_dir = self.output_dir();
        let ignore = GlobSet::new(&self.config.ignore).map_err(ConfigError::from)?;
        let source = Source::new(&source_dir, &ignore);
        source.check()?;

        if *scope == RebuildScope::Full && self.config.clean {
            clean_dir(&output_dir)?;
        }

        let mut files = match scope {
            RebuildScope::Full => source.read_all()?,
            RebuildScope::Paths(paths) => source.read_paths(paths)?,
        };
        tracing::info!(
            "read {} file(s) from {}",
            files.len(),
            source_dir.display()
        );

        let ctx = PipelineContext::new(&self.config, &self.base_path);
        self.pipeline.run(&mut files, &ctx)?;

        write_files(&files, &output_dir)?;
        tracing::info!(
            "wrote {} file(s) to {}",
            files.len(),
            output_dir.display()
        );

        Ok(BuildResult {
            output_dir,
            files: files.len(),
        })
    }
}

/// Remove a directory and everything in it. A missing directory is fine.
pub fn clean_dir(dir: &Path) -> Result<(), BuildError> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BuildError::Clean {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}

/// Write every file of the collection under `output_dir`.
fn write_files(files: &Files, output_dir: &Path) -> Result<(), BuildError> {
    std::fs::create_dir_all(output_dir).map_err(|e| BuildError::Write {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    for (relative, file) in files {
        let output_path = output_dir.join(relative);

        // Create parent directories if needed
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BuildError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(&output_path, &file.contents).map_err(|e| BuildError::Write {
            path: output_path.clone(),
            source: e,
        })?;
    }

    Ok(())
}
