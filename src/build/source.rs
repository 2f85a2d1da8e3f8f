//! Reading the source directory into a file collection.

use std::path::{Path, PathBuf};

use super::files::{FrontMatterError, Files, SourceFile};
use super::globs::GlobSet;

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("source path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("source path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read directory entry in {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        source: FrontMatterError,
    },
}

// =============================================================================
// Source directory
// =============================================================================

/// The source directory and the globs excluded from it.
pub struct Source<'a> {
    /// The directory files are read from
    pub root: &'a Path,
    /// Paths (relative to `root`) that are never read
    pub ignore: &'a GlobSet,
}

impl<'a> Source<'a> {
    pub fn new(root: &'a Path, ignore: &'a GlobSet) -> Self {
        Self { root, ignore }
    }

    /// Validate that the root exists and is a directory.
    pub fn check(&self) -> Result<(), SourceError> {
        if !self.root.exists() {
            return Err(SourceError::PathNotFound(self.root.to_path_buf()));
        }
        if !self.root.is_dir() {
            return Err(SourceError::NotADirectory(self.root.to_path_buf()));
        }
        Ok(())
    }

    /// Read every file under the root into a new collection.
    pub fn read_all(&self) -> Result<Files, SourceError> {
        self.check()?;
        let mut files = Files::new();
        for relative in self.list()? {
            let file = self.read_file(&relative)?;
            files.insert(relative, file);
        }
        Ok(files)
    }

    /// Read only the given relative paths.
    ///
    /// Paths that no longer exist (deleted since the change was seen), that
    /// are ignored, or that are hidden are skipped.
    pub fn read_paths<'p>(
        &self,
        paths: impl IntoIterator<Item = &'p PathBuf>,
    ) -> Result<Files, SourceError> {
        self.check()?;
        let mut files = Files::new();
        for relative in paths {
            if is_hidden(relative) || self.ignore.is_match(relative) {
                continue;
            }
            if !self.root.join(relative).is_file() {
                tracing::debug!("skipping {} (no longer a file)", relative.display());
                continue;
            }
            let file = self.read_file(relative)?;
            files.insert(relative.clone(), file);
        }
        Ok(files)
    }

    /// List every readable file under the root as relative paths, sorted.
    pub fn list(&self) -> Result<Vec<PathBuf>, SourceError> {
        let mut paths = Vec::new();
        self.walk_directory(self.root, &PathBuf::new(), &mut paths)?;
        paths.sort();
        Ok(paths)
    }

    fn read_file(&self, relative: &Path) -> Result<SourceFile, SourceError> {
        let path = self.root.join(relative);
        let raw = std::fs::read(&path).map_err(|e| SourceError::ReadFile {
            path: path.clone(),
            source: e,
        })?;
        SourceFile::parse(raw).map_err(|e| SourceError::FrontMatter { path, source: e })
    }

    /// Recursively walk a directory and collect file paths.
    fn walk_directory(
        &self,
        dir: &Path,
        relative_path: &Path,
        paths: &mut Vec<PathBuf>,
    ) -> Result<(), SourceError> {
        let entries = std::fs::read_dir(dir).map_err(|e| SourceError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| SourceError::ReadEntry {
                path: dir.to_path_buf(),
                source: e,
            })?;

            let path = entry.path();
            let file_name = entry.file_name();

            // Skip hidden files and directories
            if file_name.to_string_lossy().starts_with('.') {
                continue;
            }

            let item_relative_path = relative_path.join(&file_name);

            if path.is_dir() {
                self.walk_directory(&path, &item_relative_path, paths)?;
            } else if path.is_file() && !self.ignore.is_match(&item_relative_path) {
                paths.push(item_relative_path);
            }
        }

        Ok(())
    }
}

fn is_hidden(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}
