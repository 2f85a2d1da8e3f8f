//! Configuration loading from files.
//!
//! Layers, lowest priority first: built-in defaults, the YAML config file
//! (optional), then `STITCH_*` environment variables (`__` separates nested
//! keys, e.g. `STITCH_SERVE__PORT=4000`).

use std::path::{Path, PathBuf};

use config::{Environment, File, FileFormat};

use super::{CONFIG_FILE, ConfigError, SiteConfig};

impl SiteConfig {
    /// Load the config from the command line argument, defaulting to `stitch.yaml`.
    ///
    /// Returns the config together with its base path (the config file's
    /// directory), against which relative paths are resolved.
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_file = config_file.unwrap_or(Path::new(CONFIG_FILE));
        let config_file = if config_file.is_relative() {
            std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file)
        } else {
            config_file.to_path_buf()
        };

        let config = Self::load_from_file(&config_file)?;
        let base_path = base_path_from_config(&config_file);
        config.validate(&base_path)?;

        Ok((config, base_path))
    }

    /// Load the config from a file path. A missing file yields the defaults.
    pub(crate) fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix("STITCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
