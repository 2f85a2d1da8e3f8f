mod builder;
mod files;
mod globs;
mod markdown;
pub mod pipeline;
mod render;
mod source;
mod styles;
mod watch;

pub use builder::{Builder, RebuildScope, clean_dir};
pub use globs::{GlobError, GlobSet};
pub use source::Source;
pub use watch::{FileWatcher, PathClassifier, RuleTable, WatchEvent};
