//! Compiled glob lists for ignores and watch rules.
//!
//! Patterns are matched against paths relative to the source root, so
//! `layouts/**` ignores everything under `src/layouts`.

use std::path::Path;

use wax::{Glob, Pattern};

#[derive(thiserror::Error, Debug)]
#[error("'{pattern}': {message}")]
pub struct GlobError {
    pub pattern: String,
    pub message: String,
}

/// Compile a single glob into an owned matcher.
pub fn compile_glob(pattern: &str) -> Result<Glob<'static>, GlobError> {
    Glob::new(pattern)
        .map(Glob::into_owned)
        .map_err(|e| GlobError {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// A list of globs; a path matches the set if it matches any of them.
#[derive(Debug, Default)]
pub struct GlobSet {
    globs: Vec<Glob<'static>>,
}

impl GlobSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, GlobError> {
        let globs = patterns
            .iter()
            .map(|p| compile_glob(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { globs })
    }

    pub fn is_match(&self, path: &Path) -> bool {
        self.globs.iter().any(|glob| glob.is_match(path))
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_ignored() {
        let set = GlobSet::new(&["layouts/**"]).unwrap();
        assert!(set.is_match(Path::new("layouts/default.html")));
        assert!(set.is_match(Path::new("layouts/partials/nav.html")));
        assert!(!set.is_match(Path::new("about.md")));
        assert!(!set.is_match(Path::new("blog/layouts.md")));
    }

    #[test]
    fn test_any_of_several() {
        let set = GlobSet::new(&["**/*.tmp", "drafts/**"]).unwrap();
        assert!(set.is_match(Path::new("notes/a.tmp")));
        assert!(set.is_match(Path::new("drafts/post.md")));
        assert!(!set.is_match(Path::new("posts/post.md")));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = GlobSet::new::<&str>(&[]).unwrap();
        assert!(set.is_empty());
        assert!(!set.is_match(Path::new("anything")));
    }

    #[test]
    fn test_invalid_glob() {
        let err = compile_glob("[").unwrap_err();
        assert_eq!(err.pattern, "[");
    }
}
