//! Markdown to HTML conversion
//!
//! Wraps markdown-rs (CommonMark + GFM) and post-processes its output:
//! heading anchors, an optional table of contents, script removal and
//! smart punctuation.
//!
//! Anchor ids are namespaced by the source's file stem so several rendered
//! documents can be concatenated without id collisions.

mod smartypants;
mod toc;

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CompileError, Result};

pub use toc::Heading;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*?(?:/>|>.*?(?:</script\s*>|\z))").expect("script pattern is valid")
});

/// Feature set of the markdown renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    /// Turn bare URLs and emails into links
    pub autolink: bool,
    #[serde(rename = "smart-punctuation")]
    pub smart_punctuation: bool,
    /// Remove `<script>` elements from passed-through raw HTML
    #[serde(rename = "strip-scripts")]
    pub strip_scripts: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            autolink: true,
            smart_punctuation: true,
            strip_scripts: true,
        }
    }
}

/// Converts expanded markdown text into HTML
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    config: MarkdownConfig,
}

impl MarkdownRenderer {
    pub fn new(config: MarkdownConfig) -> Self {
        Self { config }
    }

    /// Render `source` to HTML, namespacing anchors by `target`'s file stem
    pub fn render(&self, target: &str, source: &str, with_toc: bool) -> Result<String> {
        let prefix = anchor_prefix(target);
        debug!(%target, %prefix, %with_toc, len = source.len(), "MarkdownRenderer::render: called");

        let parse = self.parse_options();
        let tree = ::markdown::to_mdast(source, &parse).map_err(|e| markdown_error(target, e))?;
        let html = ::markdown::to_html_with_options(
            source,
            &::markdown::Options {
                parse,
                compile: self.compile_options(&prefix),
            },
        )
        .map_err(|e| markdown_error(target, e))?;

        let (mut html, headings) = toc::anchor_headings(&html, &prefix, &toc::outline(&tree));
        if with_toc && !headings.is_empty() {
            debug!(count = headings.len(), "MarkdownRenderer::render: prepending table of contents");
            html = format!("{}{}", toc::build(&headings), html);
        }

        if self.config.strip_scripts {
            html = SCRIPT_RE.replace_all(&html, "").into_owned();
        }
        if self.config.smart_punctuation {
            html = smartypants::apply(&html);
        }
        Ok(html)
    }

    fn parse_options(&self) -> ::markdown::ParseOptions {
        ::markdown::ParseOptions {
            constructs: ::markdown::Constructs {
                gfm_autolink_literal: self.config.autolink,
                gfm_footnote_definition: self.config.footnotes,
                gfm_label_start_footnote: self.config.footnotes,
                gfm_strikethrough: self.config.strikethrough,
                gfm_table: self.config.tables,
                gfm_task_list_item: true,
                ..::markdown::Constructs::default()
            },
            ..::markdown::ParseOptions::default()
        }
    }

    fn compile_options(&self, prefix: &str) -> ::markdown::CompileOptions {
        ::markdown::CompileOptions {
            allow_dangerous_html: true,
            gfm_footnote_clobber_prefix: Some(format!("{}-", prefix)),
            ..::markdown::CompileOptions::default()
        }
    }
}

fn markdown_error(target: &str, err: impl std::fmt::Display) -> CompileError {
    CompileError::Markdown {
        target: target.to_string(),
        message: err.to_string(),
    }
}

/// File stem of `target`, reduced to id-safe characters
pub fn anchor_prefix(target: &str) -> String {
    let stem = Path::new(target)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let prefix = toc::slugify(stem);
    if prefix.is_empty() { "doc".to_string() } else { prefix }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "# Title\n\nBody text.\n";

    fn renderer() -> MarkdownRenderer {
        MarkdownRenderer::default()
    }

    #[test]
    fn test_anchor_prefix_strips_extension() {
        assert_eq!(anchor_prefix("docs/intro.md"), "intro");
        assert_eq!(anchor_prefix("Read Me.markdown"), "read-me");
        assert_eq!(anchor_prefix(""), "doc");
    }

    #[test]
    fn test_render_without_toc() {
        let html = renderer().render("intro.md", SOURCE, false).unwrap();
        assert!(html.contains("<h1 id=\"intro-title\">Title</h1>"));
        assert!(html.contains("<p>Body text.</p>"));
        assert!(!html.contains("<nav"));
    }

    #[test]
    fn test_render_with_toc() {
        let html = renderer().render("intro.md", SOURCE, true).unwrap();
        assert!(html.starts_with("<nav class=\"toc\">"));
        assert!(html.contains("<a href=\"#intro-title\">Title</a>"));
        assert!(html.contains("<h1 id=\"intro-title\">Title</h1>"));
        assert!(html.contains("<p>Body text.</p>"));
    }

    #[test]
    fn test_toc_without_headings_is_omitted() {
        let html = renderer().render("x.md", "just text\n", true).unwrap();
        assert!(!html.contains("<nav"));
    }

    #[test]
    fn test_tables_and_strikethrough() {
        let source = "| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n";
        let html = renderer().render("t.md", source, false).unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn test_tables_can_be_disabled() {
        let source = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        let r = MarkdownRenderer::new(MarkdownConfig {
            tables: false,
            ..MarkdownConfig::default()
        });
        assert!(!r.render("t.md", source, false).unwrap().contains("<table>"));
    }

    #[test]
    fn test_autolink_bare_url() {
        let html = renderer().render("t.md", "see https://example.com now\n", false).unwrap();
        assert!(html.contains("<a href=\"https://example.com\">"));
    }

    #[test]
    fn test_autolink_text_keeps_plain_punctuation() {
        let html = renderer().render("t.md", "see https://example.com/a--b...c\n", false).unwrap();
        assert!(html.contains(">https://example.com/a--b...c</a>"));
    }

    #[test]
    fn test_fenced_code_language_class() {
        let html = renderer().render("t.md", "```rust\nlet a = \"x\" -- y;\n```\n", false).unwrap();
        assert!(html.contains("<code class=\"language-rust\">"));
        // smart punctuation never touches code
        assert!(html.contains("--"));
    }

    #[test]
    fn test_footnotes_namespaced() {
        let html = renderer().render("notes.md", "Hi[^1].\n\n[^1]: A note.\n", false).unwrap();
        assert!(html.contains("notes-fn-1"));
    }

    #[test]
    fn test_scripts_removed_but_html_kept() {
        let source = "<div class=\"box\">kept</div>\n\n<script>alert(1)</script>\n";
        let html = renderer().render("t.md", source, false).unwrap();
        assert!(html.contains("<div class=\"box\">kept</div>"));
        assert!(!html.contains("<script"));
        assert!(!html.contains("alert"));
    }

    #[test]
    fn test_unterminated_script_removed() {
        let html = renderer().render("t.md", "Intro\n\n<script>alert(1)\n\nmore\n", false).unwrap();
        assert!(html.contains("<p>Intro</p>"));
        assert!(!html.contains("<script"));
        assert!(!html.contains("alert"));
    }

    #[test]
    fn test_raw_html_heading_not_anchored() {
        let source = "# Real\n\n<h2 class=\"note\">Raw</h2>\n\n## Also real\n";
        let html = renderer().render("g.md", source, true).unwrap();
        assert!(html.contains("<h1 id=\"g-real\">Real</h1>"));
        assert!(html.contains("<h2 class=\"note\">Raw</h2>"));
        assert!(html.contains("<h2 id=\"g-also-real\">Also real</h2>"));
        assert!(!html.contains("href=\"#g-raw\""));
    }

    #[test]
    fn test_toc_text_gets_smart_punctuation() {
        let html = renderer().render("q.md", "# Wait -- what\n", true).unwrap();
        assert!(html.contains("<a href=\"#q-wait-what\">Wait \u{2013} what</a>"));
        assert!(html.contains("<h1 id=\"q-wait-what\">Wait \u{2013} what</h1>"));
    }

    #[test]
    fn test_smart_punctuation_applied() {
        let html = renderer().render("t.md", "wait -- really... 1/2\n", false).unwrap();
        assert!(html.contains("wait \u{2013} really\u{2026} \u{bd}"));
    }
}
