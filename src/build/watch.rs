//! File watching for automatic rebuilds.
//!
//! Uses `notify-debouncer-full` to watch the source directory (and an
//! external layout directory) for changes, and a [`RuleTable`] to decide
//! how much of the site a change invalidates.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Config as NotifyConfig, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{
    DebounceEventResult, Debouncer, RecommendedCache, new_debouncer, new_debouncer_opt,
};
use wax::{Glob, Pattern};

use super::builder::RebuildScope;
use super::globs::{GlobError, compile_glob};
use crate::config::{Rebuild, WatchConfig, WatchRule};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),
}

// =============================================================================
// Watch events
// =============================================================================

/// Events sent from the file watcher.
#[derive(Debug)]
pub enum WatchEvent {
    /// Files changed, paths relative to the source root.
    FilesChanged(Vec<PathBuf>),
    /// Something in a layout directory outside the source root changed.
    LayoutsChanged,
    /// Watcher error occurred.
    Error(String),
}

// =============================================================================
// Rule table
// =============================================================================

enum RuleAction {
    /// Rebuild the changed file itself.
    Changed,
    /// Nothing to rebuild.
    Skip,
    /// Rebuild every source file matching the glob.
    Matching(Glob<'static>),
    /// Rebuild everything.
    Full,
}

struct CompiledRule {
    pattern: Glob<'static>,
    action: RuleAction,
}

/// Ordered watch rules, compiled.
///
/// Every rule whose pattern matches a changed path contributes to the
/// rebuild scope; the contributions are unioned.
pub struct RuleTable {
    rules: Vec<CompiledRule>,
}

impl RuleTable {
    pub fn new(rules: &[WatchRule]) -> Result<Self, GlobError> {
        let rules = rules
            .iter()
            .map(|rule| -> Result<CompiledRule, GlobError> {
                let action = match &rule.rebuild {
                    Rebuild::Changed(true) => RuleAction::Changed,
                    Rebuild::Changed(false) => RuleAction::Skip,
                    Rebuild::Pattern(p) if is_universal(p) => RuleAction::Full,
                    Rebuild::Pattern(p) => RuleAction::Matching(compile_glob(p)?),
                };
                Ok(CompiledRule {
                    pattern: compile_glob(&rule.pattern)?,
                    action,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Work out what to rebuild for a batch of changed paths.
    ///
    /// `sources` lists the source files currently on disk, for rules that
    /// rebuild everything matching a glob.
    pub fn scope(&self, changed: &[PathBuf], sources: &[PathBuf]) -> RebuildScope {
        let mut paths = BTreeSet::new();

        for path in changed {
            for rule in self.rules.iter().filter(|r| r.pattern.is_match(path.as_path())) {
                match &rule.action {
                    RuleAction::Changed => {
                        // A directory moved in is reported once, as itself
                        let under: Vec<&PathBuf> = sources
                            .iter()
                            .filter(|s| s.starts_with(path) && *s != path)
                            .collect();
                        if under.is_empty() {
                            paths.insert(path.clone());
                        } else {
                            paths.extend(under.into_iter().cloned());
                        }
                    }
                    RuleAction::Skip => {}
                    RuleAction::Matching(glob) => {
                        paths.extend(
                            sources
                                .iter()
                                .filter(|s| glob.is_match(s.as_path()))
                                .cloned(),
                        );
                    }
                    RuleAction::Full => return RebuildScope::Full,
                }
            }
        }

        RebuildScope::Paths(paths)
    }
}

fn is_universal(pattern: &str) -> bool {
    matches!(pattern.trim_start_matches("./"), "**" | "**/*")
}

// =============================================================================
// Path classification
// =============================================================================

/// Classifies changed absolute paths.
#[derive(Clone)]
pub struct PathClassifier {
    source_dir: PathBuf,
    /// Only set when the layout directory is outside the source directory.
    layouts_dir: Option<PathBuf>,
}

enum Change {
    Source(PathBuf),
    Layouts,
}

impl PathClassifier {
    pub fn new(source_dir: &Path, layouts_dir: &Path) -> Self {
        let source_dir = canonical(source_dir);
        let layouts_dir = canonical(layouts_dir);
        let layouts_dir = (!layouts_dir.starts_with(&source_dir)).then_some(layouts_dir);
        Self {
            source_dir,
            layouts_dir,
        }
    }

    /// Directories to watch recursively.
    pub fn watch_dirs(&self) -> Vec<&Path> {
        std::iter::once(self.source_dir.as_path())
            .chain(self.layouts_dir.as_deref())
            .collect()
    }

    fn classify(&self, path: &Path) -> Option<Change> {
        if let Ok(relative) = path.strip_prefix(&self.source_dir) {
            return (!is_hidden(relative) && relative.components().next().is_some())
                .then(|| Change::Source(relative.to_path_buf()));
        }

        let layouts_dir = self.layouts_dir.as_ref()?;
        let relative = path.strip_prefix(layouts_dir).ok()?;
        (!is_hidden(relative)).then_some(Change::Layouts)
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

// Skip hidden files and directories (editor swap files, .git, ...)
fn is_hidden(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

// =============================================================================
// File watcher
// =============================================================================

/// A file watcher that can use either native or polling backend.
pub enum FileWatcher {
    /// Native file system watcher (recommended for local development).
    Native {
        _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
        rx: Receiver<WatchEvent>,
    },
    /// Polling-based watcher (for network filesystems, Docker, etc.).
    Polling {
        _debouncer: Debouncer<PollWatcher, RecommendedCache>,
        rx: Receiver<WatchEvent>,
    },
}

impl FileWatcher {
    /// Create a new file watcher.
    pub fn new(config: &WatchConfig, classifier: PathClassifier) -> Result<Self, WatchError> {
        let debounce_timeout = Duration::from_millis(config.debounce_ms);

        // Create channel for events
        let (tx, rx) = mpsc::channel();

        let dirs: Vec<PathBuf> = classifier
            .watch_dirs()
            .into_iter()
            .map(Path::to_path_buf)
            .collect();

        // Callback to convert notify events to our WatchEvent type
        let callback = move |result: DebounceEventResult| match result {
            Ok(events) => {
                let mut changed = BTreeSet::new();
                let mut layouts = false;

                for event in events.iter().filter(|e| is_relevant_event(&e.kind)) {
                    for path in &event.paths {
                        match classifier.classify(path) {
                            Some(Change::Source(relative)) => {
                                changed.insert(relative);
                            }
                            Some(Change::Layouts) => layouts = true,
                            None => {}
                        }
                    }
                }

                if layouts {
                    let _ = tx.send(WatchEvent::LayoutsChanged);
                } else if !changed.is_empty() {
                    let _ = tx.send(WatchEvent::FilesChanged(changed.into_iter().collect()));
                }
            }
            Err(errors) => {
                for e in errors {
                    let _ = tx.send(WatchEvent::Error(e.to_string()));
                }
            }
        };

        if config.poll {
            // Use polling watcher
            let poll_interval = Duration::from_millis(config.poll_interval_ms);
            let notify_config = NotifyConfig::default().with_poll_interval(poll_interval);

            let mut debouncer = new_debouncer_opt::<_, PollWatcher, RecommendedCache>(
                debounce_timeout,
                None,
                callback,
                RecommendedCache::default(),
                notify_config,
            )?;

            for dir in dirs.iter().filter(|d| d.exists()) {
                debouncer.watch(dir, RecursiveMode::Recursive)?;
            }

            Ok(FileWatcher::Polling {
                _debouncer: debouncer,
                rx,
            })
        } else {
            // Use native watcher
            let mut debouncer = new_debouncer(debounce_timeout, None, callback)?;

            for dir in dirs.iter().filter(|d| d.exists()) {
                debouncer.watch(dir, RecursiveMode::Recursive)?;
            }

            Ok(FileWatcher::Native {
                _debouncer: debouncer,
                rx,
            })
        }
    }

    /// Receive the next watch event (blocking).
    pub fn recv(&self) -> Option<WatchEvent> {
        match self {
            FileWatcher::Native { rx, .. } => rx.recv().ok(),
            FileWatcher::Polling { rx, .. } => rx.recv().ok(),
        }
    }
}

/// Check if an event kind is relevant for rebuilds.
fn is_relevant_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Remove(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Any)
    )
}
