//! Stylesheet compilation with grass.

use std::path::{Path, PathBuf};

use crate::config::OutputStyle;

/// File extensions treated as stylesheet sources.
pub const STYLE_EXTENSIONS: &[&str] = &["scss", "sass"];

#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct StyleError(String);

/// A stylesheet compiler bound to its output style and load paths.
pub struct StyleCompiler {
    style: grass::OutputStyle,
    include_paths: Vec<PathBuf>,
}

impl StyleCompiler {
    pub fn new(output_style: OutputStyle, include_paths: Vec<PathBuf>) -> Self {
        let style = match output_style {
            OutputStyle::Expanded => grass::OutputStyle::Expanded,
            OutputStyle::Compressed => grass::OutputStyle::Compressed,
        };
        Self {
            style,
            include_paths,
        }
    }

    /// Compile one stylesheet to CSS.
    ///
    /// `dir` is the directory the source lives in on disk; it is searched
    /// first for imports, then the configured include paths. `.sass` files
    /// use the indented syntax.
    pub fn compile(&self, source: &str, path: &Path, dir: &Path) -> Result<String, StyleError> {
        let syntax = if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("sass")) {
            grass::InputSyntax::Sass
        } else {
            grass::InputSyntax::Scss
        };

        let options = grass::Options::default()
            .style(self.style)
            .input_syntax(syntax)
            .quiet(true)
            .load_path(dir)
            .load_paths(&self.include_paths);

        grass::from_string(source.to_string(), &options).map_err(|e| StyleError(e.to_string()))
    }
}

/// True for partials (`_name.scss`), which are only ever imported.
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}
