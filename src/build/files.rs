use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

// =============================================================================
// File collection
// =============================================================================

/// The in-memory file tree a build works on, keyed by path relative to the
/// source root. Ordered so that builds are deterministic.
pub type Files = BTreeMap<PathBuf, SourceFile>;

/// Front matter metadata: arbitrary YAML keys from the top of a file.
pub type FrontMatter = BTreeMap<String, Value>;

/// A file flowing through the build pipeline.
///
/// Contents start as the raw bytes on disk (minus the front matter block)
/// and are replaced by each stage that transforms the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFile {
    pub contents: Vec<u8>,
    pub front_matter: FrontMatter,
}

#[derive(thiserror::Error, Debug)]
pub enum FrontMatterError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,
}

impl SourceFile {
    /// A file with no front matter.
    pub fn new(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: contents.into(),
            front_matter: FrontMatter::new(),
        }
    }

    /// Build a file record from raw bytes, splitting off front matter.
    ///
    /// Only UTF-8 files that start with a `---` line can carry front matter;
    /// everything else is kept byte for byte.
    pub fn parse(raw: Vec<u8>) -> Result<Self, FrontMatterError> {
        let Ok(text) = std::str::from_utf8(&raw) else {
            return Ok(Self::new(raw));
        };
        let Some((yaml, body)) = split_front_matter(text) else {
            return Ok(Self::new(raw));
        };

        let front_matter = parse_front_matter(yaml)?;
        Ok(Self {
            contents: body.trim_start_matches(['\r', '\n']).as_bytes().to_vec(),
            front_matter,
        })
    }

    /// The contents as text, if they are valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }

    /// Look up a front matter value rendered as a plain string.
    ///
    /// Strings, numbers and booleans are rendered; anything else is `None`.
    pub fn meta_str(&self, key: &str) -> Option<String> {
        match self.front_matter.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// True when the front matter sets `key: false` explicitly.
    pub fn meta_disabled(&self, key: &str) -> bool {
        matches!(self.front_matter.get(key), Some(Value::Bool(false)))
    }
}

/// Split `---\n<yaml>\n---\n<body>` into its YAML and body parts.
///
/// Both delimiters must sit on their own line; returns `None` when the text
/// has no (closed) front matter block.
pub fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---")?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Parse a front matter YAML block. An empty block is an empty mapping.
fn parse_front_matter(yaml: &str) -> Result<FrontMatter, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::new());
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Null => Ok(FrontMatter::new()),
        value @ Value::Mapping(_) => Ok(serde_yaml::from_value(value)?),
        _ => Err(FrontMatterError::NotAMapping),
    }
}

/// True if the path has one of the given extensions (case-insensitive).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// True for rendered pages, the entries permalinks and layouts act on.
pub fn is_html(path: &Path) -> bool {
    has_extension(path, &["html"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_front_matter_basic() {
        let raw = "---\ntitle: My Page\ndescription: A test page\n---\n\n# Hello World\n";
        let file = SourceFile::parse(raw.as_bytes().to_vec()).unwrap();
        assert_eq!(file.meta_str("title").as_deref(), Some("My Page"));
        assert_eq!(file.meta_str("description").as_deref(), Some("A test page"));
        assert_eq!(file.text(), Some("# Hello World\n"));
    }

    #[test]
    fn test_parse_front_matter_with_custom_fields() {
        let raw = r#"---
title: Custom Page
order: 3
published: true
tags:
  - rust
  - documentation
---
Content here
"#;
        let file = SourceFile::parse(raw.as_bytes().to_vec()).unwrap();
        assert_eq!(file.meta_str("order").as_deref(), Some("3"));
        assert_eq!(file.meta_str("published").as_deref(), Some("true"));
        assert!(file.front_matter.contains_key("tags"));
        assert_eq!(file.meta_str("tags"), None);
        assert_eq!(file.text(), Some("Content here\n"));
    }

    #[test]
    fn test_parse_no_front_matter() {
        let raw = "# Just Markdown\n\nNo front matter here.";
        let file = SourceFile::parse(raw.as_bytes().to_vec()).unwrap();
        assert!(file.front_matter.is_empty());
        assert_eq!(file.text(), Some(raw));
    }

    #[test]
    fn test_parse_empty_front_matter() {
        let file = SourceFile::parse(b"---\n---\n\n# Content".to_vec()).unwrap();
        assert!(file.front_matter.is_empty());
        assert_eq!(file.text(), Some("# Content"));
    }

    #[test]
    fn test_unclosed_front_matter_is_content() {
        let raw = "---\ntitle: nope\n# Heading";
        let file = SourceFile::parse(raw.as_bytes().to_vec()).unwrap();
        assert!(file.front_matter.is_empty());
        assert_eq!(file.text(), Some(raw));
    }

    #[test]
    fn test_horizontal_rule_is_not_front_matter() {
        let raw = "intro\n---\nmore";
        let file = SourceFile::parse(raw.as_bytes().to_vec()).unwrap();
        assert!(file.front_matter.is_empty());
    }

    #[test]
    fn test_invalid_front_matter() {
        let err = SourceFile::parse(b"---\ntitle: [unclosed\n---\nbody".to_vec()).unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));

        let err = SourceFile::parse(b"---\n- a\n- b\n---\nbody".to_vec()).unwrap_err();
        assert!(matches!(err, FrontMatterError::NotAMapping));
    }

    #[test]
    fn test_binary_untouched() {
        let raw = vec![0xff, 0xfe, b'-', b'-', b'-'];
        let file = SourceFile::parse(raw.clone()).unwrap();
        assert_eq!(file.contents, raw);
        assert_eq!(file.text(), None);
    }

    #[test]
    fn test_meta_disabled() {
        let file = SourceFile::parse(b"---\npermalink: false\nlayout: post.html\n---\n".to_vec())
            .unwrap();
        assert!(file.meta_disabled("permalink"));
        assert!(!file.meta_disabled("layout"));
        assert!(!file.meta_disabled("missing"));
    }

    #[test]
    fn test_extensions() {
        assert!(has_extension(Path::new("a/b.MD"), &["md", "markdown"]));
        assert!(!has_extension(Path::new("a/b"), &["md"]));
        assert!(is_html(Path::new("about/index.html")));
        assert!(!is_html(Path::new("css/main.css")));
    }
}
