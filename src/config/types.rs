//! Configuration type definitions.
//!
//! This module contains all the data structures used in `stitch.yaml`.
//! These types are pure data - no I/O or complex logic.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Site configuration
// =============================================================================

/// The whole pipeline configuration: where to read, where to write, and how
/// each step behaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Global values available to every step and every layout (e.g. `site.title`)
    #[serde(default = "default_metadata")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Directory the file collection is read from
    #[serde(default = "default_source")]
    pub source: PathBuf,
    /// Directory the file collection is written to
    #[serde(default = "default_destination")]
    pub destination: PathBuf,
    /// Remove the destination before each full build
    #[serde(default = "default_clean")]
    pub clean: bool,
    /// Globs (relative to the source root) that are never read into the collection
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub styles: StylesConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default)]
    pub permalinks: PermalinksConfig,
    #[serde(default)]
    pub layouts: LayoutsConfig,
    /// Dev server settings; `null` disables the server for the default command
    #[serde(default = "default_serve")]
    pub serve: Option<ServeConfig>,
    /// Watcher settings; `null` disables watching for the default command
    #[serde(default = "default_watch")]
    pub watch: Option<WatchConfig>,
}

fn default_metadata() -> serde_json::Map<String, serde_json::Value> {
    let mut metadata = serde_json::Map::new();
    metadata.insert(
        "site".to_string(),
        serde_json::json!({
            "title": "Lokesh Dhakar",
            "url": "https://lokeshdhakar.com",
        }),
    );
    metadata
}

fn default_source() -> PathBuf {
    PathBuf::from("src")
}

fn default_destination() -> PathBuf {
    PathBuf::from("dist")
}

fn default_clean() -> bool {
    true
}

fn default_ignore() -> Vec<String> {
    vec!["layouts/**".to_string()]
}

fn default_serve() -> Option<ServeConfig> {
    Some(ServeConfig::default())
}

fn default_watch() -> Option<WatchConfig> {
    Some(WatchConfig::default())
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            metadata: default_metadata(),
            source: default_source(),
            destination: default_destination(),
            clean: default_clean(),
            ignore: default_ignore(),
            styles: StylesConfig::default(),
            markdown: MarkdownConfig::default(),
            permalinks: PermalinksConfig::default(),
            layouts: LayoutsConfig::default(),
            serve: default_serve(),
            watch: default_watch(),
        }
    }
}

// =============================================================================
// Styles configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylesConfig {
    /// Collection directory compiled stylesheets are placed in
    #[serde(default = "default_styles_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub output_style: OutputStyle,
    /// Extra directories searched by `@import` / `@use`
    #[serde(default)]
    pub include_paths: Vec<PathBuf>,
}

fn default_styles_output_dir() -> PathBuf {
    PathBuf::from("css")
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            output_dir: default_styles_output_dir(),
            output_style: OutputStyle::default(),
            include_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    #[default]
    Expanded,
    Compressed,
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "tables".to_string(),
        "footnotes".to_string(),
        "strikethrough".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}

// =============================================================================
// Permalinks configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermalinksConfig {
    /// Output directory pattern; `:key` segments are filled from front matter
    #[serde(default = "default_permalink_pattern")]
    pub pattern: String,
}

fn default_permalink_pattern() -> String {
    ":title".to_string()
}

impl Default for PermalinksConfig {
    fn default() -> Self {
        Self {
            pattern: default_permalink_pattern(),
        }
    }
}

// =============================================================================
// Layouts configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutsConfig {
    /// Template directory (relative to the config file)
    #[serde(default = "default_layouts_directory")]
    pub directory: PathBuf,
    /// Layout used when a page does not name one
    #[serde(default = "default_layout")]
    pub default: Option<String>,
}

fn default_layouts_directory() -> PathBuf {
    PathBuf::from("src/layouts")
}

fn default_layout() -> Option<String> {
    Some("default.html".to_string())
}

impl Default for LayoutsConfig {
    fn default() -> Self {
        Self {
            directory: default_layouts_directory(),
            default: default_layout(),
        }
    }
}

// =============================================================================
// Development configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    /// The address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// The port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Configuration for file watching during development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Enable live reload in the browser when files change (default: true)
    #[serde(default = "default_live_reload")]
    pub live_reload: bool,
    /// Use polling-based watcher instead of native file system events.
    /// Useful for network filesystems, Docker volumes, or other situations
    /// where native events are unreliable.
    #[serde(default)]
    pub poll: bool,
    /// Poll interval in milliseconds (only used if poll=true).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Debounce timeout in milliseconds.
    /// Changes within this window are batched together.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Ordered rules mapping changed source paths to what gets rebuilt.
    #[serde(default = "default_watch_rules")]
    pub rules: Vec<WatchRule>,
}

fn default_live_reload() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_watch_rules() -> Vec<WatchRule> {
    vec![
        WatchRule::new("**/*", Rebuild::Changed(true)),
        // A stylesheet, script or layout edit can affect any output.
        WatchRule::new("css/**/*", Rebuild::Pattern("**/*".to_string())),
        WatchRule::new("js/**/*", Rebuild::Pattern("**/*".to_string())),
        WatchRule::new("layouts/**/*", Rebuild::Pattern("**/*".to_string())),
    ]
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            live_reload: default_live_reload(),
            poll: false,
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
            rules: default_watch_rules(),
        }
    }
}

/// A single watch rule.
///
/// ```yaml
/// rules:
///   - pattern: "**/*"
///     rebuild: true          # rebuild just the changed file
///   - pattern: "css/**/*"
///     rebuild: "**/*"        # rebuild everything matching this glob instead
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchRule {
    /// Glob matched against the changed path, relative to the source root
    pub pattern: String,
    pub rebuild: Rebuild,
}

impl WatchRule {
    pub fn new(pattern: impl Into<String>, rebuild: Rebuild) -> Self {
        Self {
            pattern: pattern.into(),
            rebuild,
        }
    }
}

/// What a matching watch rule asks to rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rebuild {
    /// `true` rebuilds the changed file itself, `false` ignores it
    Changed(bool),
    /// Rebuild every source file matching this glob
    Pattern(String),
}
