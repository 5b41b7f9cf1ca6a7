//! HTML panel rendering.
//!
//! The panel is a standalone HTML file that is rewritten on every update, so a
//! browser or editor preview pointed at it always shows the latest text.

use super::{Notice, PresentationSink};
use pulldown_cmark::{html, Options, Parser};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Convert markdown to an HTML fragment.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut body = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut body, parser);
    body
}

/// Escape text for use inside an HTML element.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Rewrites an HTML file with the rendered remediation text.
pub struct HtmlPanel {
    path: PathBuf,
    title: String,
    status: Option<String>,
    last_body: String,
}

impl HtmlPanel {
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            status: None,
            last_body: String::new(),
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Build the whole document for the given rendered body.
    fn document(&self, body: &str) -> String {
        let mut doc = String::new();
        doc.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        doc.push_str(&format!("<title>{}</title>\n", escape(&self.title)));
        doc.push_str("</head>\n<body>\n");
        if let Some(ref status) = self.status {
            doc.push_str(&format!("<p class=\"status\">{}</p>\n", escape(status)));
        }
        doc.push_str(&format!("<div class=\"markdown-body\">{}</div>\n", body));
        doc.push_str("</body>\n</html>\n");
        doc
    }

    fn write(&self) {
        let content = self.document(&self.last_body);
        if let Err(e) = std::fs::write(&self.path, content) {
            warn!("Failed to update panel {}: {}", self.path.display(), e);
        }
    }
}

impl PresentationSink for HtmlPanel {
    fn render(&mut self, accumulated: &str) {
        self.last_body = render_markdown(accumulated);
        self.write();
    }

    fn notify(&mut self, notice: Notice) {
        self.status = match notice {
            Notice::Progress(_) | Notice::Info(_) => return,
            Notice::Warning(message) => Some(format!("Warning: {}", message)),
            Notice::Error(message) => Some(format!("Error: {}", message)),
            Notice::Completed => Some("Dockerfile security analysis is completed!".to_string()),
        };
        debug!("Panel status: {:?}", self.status);
        self.write();
    }
}
