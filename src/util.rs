//! Shared utility functions.

use std::path::{Component, Path, PathBuf};

/// Resolve a relative path against a base path; absolute paths are kept.
pub fn resolve_path(base_path: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base_path.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into
/// their parent. Does not touch the filesystem, so it works for
/// directories that do not exist yet.
///
/// "/site/./src/../dist/" -> "/site/dist"
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Render a relative path with forward slashes, whatever the platform.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Format an error and its chain of sources on one line.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            resolve_path(Path::new("/site"), Path::new("src")),
            PathBuf::from("/site/src")
        );
        assert_eq!(
            resolve_path(Path::new("/site"), Path::new("/abs/dist")),
            PathBuf::from("/abs/dist")
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/site/./src/../dist/")),
            PathBuf::from("/site/dist")
        );
        assert_eq!(normalize_path(Path::new("a/b/../../c")), PathBuf::from("c"));
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_slash_path() {
        let path: PathBuf = ["blog", "post", "index.html"].iter().collect();
        assert_eq!(slash_path(&path), "blog/post/index.html");
        assert_eq!(slash_path(Path::new("")), "");
    }
}
