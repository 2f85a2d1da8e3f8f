//! Permalink stage.
//!
//! Gives every page a clean URL by moving `page.html` to
//! `<permalink>/index.html`, where the permalink comes from a pattern
//! filled in from front matter.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::build::files::{Files, SourceFile, is_html};
use crate::build::pipeline::{PipelineContext, PipelineError, Stage};
use crate::util::slash_path;

/// Stage that moves HTML entries to `<dir>/index.html`.
///
/// The directory comes from the configured pattern (e.g. `:title` or
/// `blog/:title`), where each `:key` is the slugified front matter value.
/// When a key is missing the page keeps its own path without extension.
/// Pages with `permalink: false` are left where they are. Each moved page
/// gets a `path` front matter entry holding its directory.
pub struct PermalinksStage;

impl Stage for PermalinksStage {
    fn name(&self) -> &'static str {
        "permalinks"
    }

    fn process(&self, files: &mut Files, ctx: &PipelineContext) -> Result<(), PipelineError> {
        let pattern = &ctx.config.permalinks.pattern;

        // target -> source path, to report clashes
        let mut origins: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
        let mut moved = Files::new();

        for (path, mut file) in std::mem::take(files) {
            let target = if is_html(&path) && !file.meta_disabled("permalink") {
                let dir = expand_pattern(pattern, &file).unwrap_or_else(|| fallback_dir(&path));
                file.front_matter
                    .insert("path".to_string(), Value::String(dir.clone()));
                index_path(&dir)
            } else {
                path.clone()
            };

            if let Some(origin) = origins.get(&target) {
                return Err(PipelineError::stage(
                    "permalinks",
                    format!(
                        "{} and {} both map to {}",
                        origin.display(),
                        path.display(),
                        target.display()
                    ),
                ));
            }

            if target != path {
                tracing::debug!("{} -> {}", path.display(), target.display());
            }
            origins.insert(target.clone(), path);
            moved.insert(target, file);
        }

        *files = moved;
        Ok(())
    }
}

/// Fill `:key` placeholders from front matter.
///
/// Returns `None` if any key is missing or slugifies to nothing.
fn expand_pattern(pattern: &str, file: &SourceFile) -> Option<String> {
    let mut out = String::new();
    let mut rest = pattern;

    while let Some(pos) = rest.find(':') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let key_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if key_len == 0 {
            out.push(':');
            rest = after;
            continue;
        }

        let slug = slug::slugify(file.meta_str(&after[..key_len])?);
        if slug.is_empty() {
            return None;
        }
        out.push_str(&slug);
        rest = &after[key_len..];
    }
    out.push_str(rest);

    Some(out.trim_matches('/').to_string())
}

/// The page's own path without extension; `index` pages map to their directory.
///
/// "blog/post.html" -> "blog/post", "blog/index.html" -> "blog"
fn fallback_dir(path: &Path) -> String {
    let parent = path.parent().unwrap_or(Path::new(""));
    match path.file_stem().and_then(|s| s.to_str()) {
        Some("index") | None => slash_path(parent),
        Some(stem) => slash_path(&parent.join(stem)),
    }
}

fn index_path(dir: &str) -> PathBuf {
    if dir.is_empty() {
        PathBuf::from("index.html")
    } else {
        PathBuf::from(dir).join("index.html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::pipeline::stages::test_support::{files, paths};
    use crate::config::SiteConfig;

    fn run(pattern: &str, entries: &[(&str, &str)]) -> Result<Files, PipelineError> {
        let mut config = SiteConfig::default();
        config.permalinks.pattern = pattern.to_string();
        let ctx = PipelineContext::new(&config, Path::new("/site"));
        let mut files = files(entries);
        PermalinksStage.process(&mut files, &ctx)?;
        Ok(files)
    }

    #[test]
    fn test_title_permalink() {
        let files = run(
            ":title",
            &[
                ("foo.html", "---\ntitle: bar\n---\n<p>x</p>"),
                ("css/main.css", "a{}"),
            ],
        )
        .unwrap();

        assert_eq!(paths(&files), vec!["bar/index.html", "css/main.css"]);
        assert_eq!(
            files[Path::new("bar/index.html")].meta_str("path").as_deref(),
            Some("bar")
        );
    }

    #[test]
    fn test_title_is_slugified() {
        let files = run(":title", &[("a.html", "---\ntitle: Hello, World!\n---\n")]).unwrap();
        assert_eq!(paths(&files), vec!["hello-world/index.html"]);
    }

    #[test]
    fn test_nested_pattern() {
        let files = run(
            "blog/:year/:title",
            &[("posts/a.html", "---\ntitle: First Post\nyear: 2016\n---\n")],
        )
        .unwrap();
        assert_eq!(paths(&files), vec!["blog/2016/first-post/index.html"]);
    }

    #[test]
    fn test_missing_key_falls_back_to_path() {
        let files = run(
            ":title",
            &[
                ("index.html", "<p>home</p>"),
                ("blog/index.html", "<p>blog</p>"),
                ("blog/untitled.html", "<p>u</p>"),
            ],
        )
        .unwrap();

        assert_eq!(
            paths(&files),
            vec!["blog/index.html", "blog/untitled/index.html", "index.html"]
        );
        assert_eq!(
            files[Path::new("index.html")].meta_str("path").as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_permalink_false_keeps_path() {
        let files = run(
            ":title",
            &[("404.html", "---\ntitle: Not Found\npermalink: false\n---\n")],
        )
        .unwrap();
        assert_eq!(paths(&files), vec!["404.html"]);
    }

    #[test]
    fn test_clash_is_an_error() {
        let err = run(
            ":title",
            &[
                ("a.html", "---\ntitle: same\n---\n"),
                ("b.html", "---\ntitle: Same\n---\n"),
            ],
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("a.html"));
        assert!(message.contains("b.html"));
        assert!(message.contains("same/index.html"));
    }

    #[test]
    fn test_fallback_dir() {
        assert_eq!(fallback_dir(Path::new("blog/post.html")), "blog/post");
        assert_eq!(fallback_dir(Path::new("blog/index.html")), "blog");
        assert_eq!(fallback_dir(Path::new("index.html")), "");
    }
}
