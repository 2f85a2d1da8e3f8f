//! Markdown rendering with pulldown-cmark.

use pulldown_cmark::{Options, Parser, html};

use crate::config::MarkdownConfig;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// File extensions treated as markdown sources.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mkdn", "mkd", "mdown"];

/// Translate the configured extension names into parser options.
pub fn parser_options(markdown_config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &markdown_config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "smart_punctuation" => options.insert(Options::ENABLE_SMART_PUNCTUATION),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

/// Render markdown to an HTML fragment.
pub fn render_markdown(markdown: &str, options: Options) -> String {
    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    html_output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let options = parser_options(&MarkdownConfig::default()).unwrap();
        let html = render_markdown("# Hello\n\nWorld", options);
        assert_eq!(html, "<h1>Hello</h1>\n<p>World</p>\n");
    }

    #[test]
    fn test_render_table() {
        let options = parser_options(&MarkdownConfig::default()).unwrap();
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n", options);
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_tables_off_when_not_configured() {
        let config = MarkdownConfig { extensions: vec![] };
        let options = parser_options(&config).unwrap();
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n", options);
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn test_invalid_extension() {
        let config = MarkdownConfig {
            extensions: vec!["not_a_real_extension".to_string()],
        };
        let result = parser_options(&config);
        assert!(matches!(result, Err(MarkdownError::InvalidExtension(name)) if name == "not_a_real_extension"));
    }
}
