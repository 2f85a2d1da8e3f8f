//! Configuration loading and types for stitch.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)
//! - Validating the directory layout before a build touches the disk

mod load;
mod types;

use std::path::{Path, PathBuf};

use crate::build::GlobSet;
use crate::util::{normalize_path, resolve_path};

// Re-export all types for convenient access
pub use types::{
    MarkdownConfig, OutputStyle, Rebuild, ServeConfig, SiteConfig, WatchConfig, WatchRule,
};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "stitch.yaml";

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("{0}")]
    Validation(String),

    #[error("invalid glob: {0}")]
    Glob(#[from] crate::build::GlobError),
}

// =============================================================================
// Validation
// =============================================================================

impl SiteConfig {
    /// Check the invariants a build relies on.
    ///
    /// Source and destination must be two different directories, and neither
    /// may contain the other: a clean would otherwise delete sources, and a
    /// read would pick up previous output. Every glob must compile.
    pub fn validate(&self, base_path: &Path) -> Result<(), ConfigError> {
        let source = normalize_path(&resolve_path(base_path, &self.source));
        let destination = normalize_path(&resolve_path(base_path, &self.destination));

        if source == destination {
            return Err(ConfigError::Validation(format!(
                "source and destination must be distinct directories (both are {})",
                source.display()
            )));
        }
        if destination.starts_with(&source) {
            return Err(ConfigError::Validation(format!(
                "destination {} is inside source {}",
                destination.display(),
                source.display()
            )));
        }
        if source.starts_with(&destination) {
            return Err(ConfigError::Validation(format!(
                "source {} is inside destination {}",
                source.display(),
                destination.display()
            )));
        }

        GlobSet::new(&self.ignore)?;
        if let Some(watch) = &self.watch {
            crate::build::RuleTable::new(&watch.rules)?;
        }

        Ok(())
    }

    /// The source directory, resolved against `base_path`.
    pub fn source_dir(&self, base_path: &Path) -> PathBuf {
        resolve_path(base_path, &self.source)
    }

    /// The destination directory, resolved against `base_path`.
    pub fn destination_dir(&self, base_path: &Path) -> PathBuf {
        resolve_path(base_path, &self.destination)
    }

    /// The layout template directory, resolved against `base_path`.
    pub fn layouts_dir(&self, base_path: &Path) -> PathBuf {
        resolve_path(base_path, &self.layouts.directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SiteConfig::default();
        assert!(config.validate(Path::new("/site")).is_ok());
    }

    #[test]
    fn test_same_source_and_destination_rejected() {
        let config = SiteConfig {
            destination: PathBuf::from("./src/"),
            ..SiteConfig::default()
        };
        let err = config.validate(Path::new("/site")).unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    fn test_nested_destination_rejected() {
        let config = SiteConfig {
            destination: PathBuf::from("src/out"),
            ..SiteConfig::default()
        };
        assert!(config.validate(Path::new("/site")).is_err());

        let config = SiteConfig {
            source: PathBuf::from("dist/../dist/src"),
            ..SiteConfig::default()
        };
        assert!(config.validate(Path::new("/site")).is_err());
    }

    #[test]
    fn test_sibling_with_common_prefix_allowed() {
        let config = SiteConfig {
            source: PathBuf::from("site"),
            destination: PathBuf::from("site-out"),
            ..SiteConfig::default()
        };
        assert!(config.validate(Path::new("/work")).is_ok());
    }

    #[test]
    fn test_bad_ignore_glob_rejected() {
        let config = SiteConfig {
            ignore: vec!["[".to_string()],
            ..SiteConfig::default()
        };
        assert!(matches!(
            config.validate(Path::new("/site")),
            Err(ConfigError::Glob(_))
        ));
    }

    #[test]
    fn test_dirs_resolve_against_base() {
        let config = SiteConfig::default();
        let base = Path::new("/site");
        assert_eq!(config.source_dir(base), PathBuf::from("/site/src"));
        assert_eq!(config.destination_dir(base), PathBuf::from("/site/dist"));
        assert_eq!(config.layouts_dir(base), PathBuf::from("/site/src/layouts"));
    }
}
