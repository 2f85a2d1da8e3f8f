use std::path::Path;

use tera::{Context, Tera};

use super::files::FrontMatter;
use crate::util::error_chain;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to load layouts from {dir}: {message}")]
    Load { dir: String, message: String },

    #[error("layout '{0}' not found")]
    LayoutNotFound(String),

    #[error("failed to render layout '{layout}': {message}")]
    Render { layout: String, message: String },
}

/// The layout renderer, wrapping Tera.
///
/// Layout output is HTML assembled from already-rendered HTML, so
/// autoescaping is off: `{{ contents }}` inserts the page body verbatim.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Load every template under `layouts_path`, named by their path
    /// relative to it (e.g. `default.html`, `partials/nav.html`).
    ///
    /// A missing directory yields a renderer with no layouts; any page that
    /// asks for one then fails with [`RenderError::LayoutNotFound`].
    pub fn new(layouts_path: &Path) -> Result<Self, RenderError> {
        let mut tera = if layouts_path.is_dir() {
            let glob = layouts_path.join("**/*");
            let glob_str = glob.to_string_lossy();
            Tera::new(&glob_str).map_err(|e| RenderError::Load {
                dir: layouts_path.display().to_string(),
                message: error_chain(&e),
            })?
        } else {
            Tera::default()
        };
        tera.autoescape_on(vec![]);

        Ok(Self { tera })
    }

    /// Create a renderer from in-memory templates.
    #[cfg(test)]
    pub fn from_templates(templates: &[(&str, &str)]) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates.iter().copied())
            .map_err(|e| RenderError::Load {
                dir: "<memory>".to_string(),
                message: error_chain(&e),
            })?;
        tera.autoescape_on(vec![]);
        Ok(Self { tera })
    }

    pub fn has_layout(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render a page body inside the named layout.
    pub fn render_layout(&self, layout: &str, page: &LayoutContext) -> Result<String, RenderError> {
        if !self.has_layout(layout) {
            return Err(RenderError::LayoutNotFound(layout.to_string()));
        }

        let mut tera_context = Context::new();
        for (key, value) in page.metadata {
            tera_context.insert(key.as_str(), value);
        }
        for (key, value) in page.front_matter {
            tera_context.insert(key.as_str(), value);
        }
        tera_context.insert("contents", page.contents);

        self.tera
            .render(layout, &tera_context)
            .map_err(|e| RenderError::Render {
                layout: layout.to_string(),
                message: error_chain(&e),
            })
    }
}

/// Everything a layout can see.
///
/// Later sources win on key clashes: site metadata, then the page's front
/// matter, then `contents`.
pub struct LayoutContext<'a> {
    pub metadata: &'a serde_json::Map<String, serde_json::Value>,
    pub front_matter: &'a FrontMatter,
    pub contents: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> serde_json::Map<String, serde_json::Value> {
        let mut metadata = serde_json::Map::new();
        metadata.insert(
            "site".to_string(),
            serde_json::json!({ "title": "My Site", "url": "https://example.com" }),
        );
        metadata
    }

    #[test]
    fn test_render_layout_substitutes_everything() {
        let renderer = Renderer::from_templates(&[(
            "default.html",
            "<title>{{ title }} | {{ site.title }}</title>{{ contents }}",
        )])
        .unwrap();

        let mut front_matter = FrontMatter::new();
        front_matter.insert("title".to_string(), "About".into());
        let metadata = metadata();
        let html = renderer
            .render_layout(
                "default.html",
                &LayoutContext {
                    metadata: &metadata,
                    front_matter: &front_matter,
                    contents: "<h1>Hi</h1>",
                },
            )
            .unwrap();

        assert_eq!(html, "<title>About | My Site</title><h1>Hi</h1>");
    }

    #[test]
    fn test_missing_layout() {
        let renderer = Renderer::from_templates(&[("default.html", "{{ contents }}")]).unwrap();
        let metadata = metadata();
        let err = renderer
            .render_layout(
                "post.html",
                &LayoutContext {
                    metadata: &metadata,
                    front_matter: &FrontMatter::new(),
                    contents: "",
                },
            )
            .unwrap_err();
        assert!(matches!(err, RenderError::LayoutNotFound(name) if name == "post.html"));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("partials")).unwrap();
        std::fs::write(dir.path().join("default.html"), "{% include \"partials/nav.html\" %}{{ contents }}").unwrap();
        std::fs::write(dir.path().join("partials/nav.html"), "<nav></nav>").unwrap();

        let renderer = Renderer::new(dir.path()).unwrap();
        assert!(renderer.has_layout("default.html"));
        assert!(renderer.has_layout("partials/nav.html"));

        let metadata = serde_json::Map::new();
        let html = renderer
            .render_layout(
                "default.html",
                &LayoutContext {
                    metadata: &metadata,
                    front_matter: &FrontMatter::new(),
                    contents: "<p>x</p>",
                },
            )
            .unwrap();
        assert_eq!(html, "<nav></nav><p>x</p>");
    }

    #[test]
    fn test_missing_directory_has_no_layouts() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(&dir.path().join("layouts")).unwrap();
        assert!(!renderer.has_layout("default.html"));
    }
}
