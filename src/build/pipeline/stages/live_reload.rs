//! Live reload injection stage.

use crate::build::files::{Files, is_html};
use crate::build::pipeline::{PipelineContext, PipelineError, Stage};

/// Server-sent events endpoint the dev server publishes reloads on.
pub const LIVE_RELOAD_PATH: &str = "/_stitch/live-reload";

/// Client snippet: reload the page whenever the server says so.
pub const LIVE_RELOAD_SCRIPT: &str = concat!(
    "<script>new EventSource(\"",
    "/_stitch/live-reload",
    "\").addEventListener(\"reload\", () => location.reload());</script>"
);

/// Stage that injects the live reload client into every HTML page.
///
/// The script goes right before the last `</body>`, or at the end of pages
/// without one. Only used while serving with live reload enabled.
pub struct LiveReloadStage;

impl Stage for LiveReloadStage {
    fn name(&self) -> &'static str {
        "live-reload"
    }

    fn process(&self, files: &mut Files, _ctx: &PipelineContext) -> Result<(), PipelineError> {
        for (_, file) in files.iter_mut().filter(|(p, _)| is_html(p)) {
            let Some(html) = file.text() else {
                continue;
            };
            file.contents = inject(html).into_bytes();
        }
        Ok(())
    }
}

fn inject(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + LIVE_RELOAD_SCRIPT.len());
    // ASCII lowercasing keeps byte offsets intact
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(pos) => {
            out.push_str(&html[..pos]);
            out.push_str(LIVE_RELOAD_SCRIPT);
            out.push_str(&html[pos..]);
        }
        None => {
            out.push_str(html);
            out.push_str(LIVE_RELOAD_SCRIPT);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::build::pipeline::stages::test_support::{files, text};
    use crate::config::SiteConfig;

    #[test]
    fn test_script_points_at_endpoint() {
        assert!(LIVE_RELOAD_SCRIPT.contains(LIVE_RELOAD_PATH));
    }

    #[test]
    fn test_injects_before_body_close() {
        assert_eq!(
            inject("<html><BODY>x</BODY></html>"),
            format!("<html><BODY>x{LIVE_RELOAD_SCRIPT}</BODY></html>")
        );
        assert_eq!(inject("<p>x</p>"), format!("<p>x</p>{LIVE_RELOAD_SCRIPT}"));
    }

    #[test]
    fn test_only_html_entries() {
        let config = SiteConfig::default();
        let ctx = PipelineContext::new(&config, Path::new("/site"));
        let mut files = files(&[("a/index.html", "<body></body>"), ("css/main.css", "a{}")]);

        LiveReloadStage.process(&mut files, &ctx).unwrap();

        assert!(text(&files, "a/index.html").contains("EventSource"));
        assert_eq!(text(&files, "css/main.css"), "a{}");
    }
}
