//! Pipeline context for sharing state across stages.

use std::path::{Path, PathBuf};

use crate::config::SiteConfig;
use crate::util::resolve_path;

/// Shared, read-only context for pipeline stages.
///
/// Holds the site metadata and per-stage settings, with every directory
/// already resolved against the config file's location.
pub struct PipelineContext<'a> {
    /// The full site configuration
    pub config: &'a SiteConfig,

    /// Directory the collection was read from (for import resolution)
    pub source_dir: PathBuf,

    /// Directory layouts are loaded from
    pub layouts_dir: PathBuf,

    /// Extra stylesheet import directories
    pub include_paths: Vec<PathBuf>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(config: &'a SiteConfig, base_path: &Path) -> Self {
        Self {
            config,
            source_dir: config.source_dir(base_path),
            layouts_dir: config.layouts_dir(base_path),
            include_paths: config
                .styles
                .include_paths
                .iter()
                .map(|p| resolve_path(base_path, p))
                .collect(),
        }
    }

    /// Global metadata available to every stage and layout.
    pub fn metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.config.metadata
    }
}
