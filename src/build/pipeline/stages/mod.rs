//! Default pipeline stages.
//!
//! The standard file processing pipeline consists of:
//!
//! 1. **StylesStage** - Compile SCSS/Sass sources into CSS
//! 2. **MarkdownStage** - Convert markdown to HTML
//! 3. **PermalinksStage** - Move pages to `<slug>/index.html`
//! 4. **LayoutsStage** - Wrap pages in their layout template
//!
//! **LiveReloadStage** is only added by the dev server.

mod layouts;
mod live_reload;
mod markdown;
mod permalinks;
mod styles;

pub use layouts::LayoutsStage;
pub use live_reload::{LIVE_RELOAD_PATH, LiveReloadStage};
pub use markdown::MarkdownStage;
pub use permalinks::PermalinksStage;
pub use styles::StylesStage;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};

    use crate::build::files::{Files, SourceFile};

    /// Build a collection from `(path, raw contents)` pairs, parsing front matter.
    pub fn files(entries: &[(&str, &str)]) -> Files {
        entries
            .iter()
            .map(|(path, raw)| {
                (
                    PathBuf::from(path),
                    SourceFile::parse(raw.as_bytes().to_vec()).unwrap(),
                )
            })
            .collect()
    }

    pub fn text<'a>(files: &'a Files, path: &str) -> &'a str {
        files[Path::new(path)].text().unwrap()
    }

    pub fn paths(files: &Files) -> Vec<String> {
        files
            .keys()
            .map(|p| crate::util::slash_path(p))
            .collect()
    }
}
