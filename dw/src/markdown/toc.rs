//! Heading anchors and table of contents
//!
//! Which `<hN>` tags in the rendered HTML are markdown headings is decided
//! from the syntax tree: raw HTML headings are left exactly as written.

use std::collections::HashMap;
use std::sync::LazyLock;

use ::markdown::mdast::Node;
use regex::Regex;

static OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<h([1-6])(?:\s[^>]*)?>").expect("heading pattern is valid"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// A rendered heading that received an anchor id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub id: String,
    /// Heading content with inline tags removed
    pub text: String,
}

/// Origin of one heading open tag in the rendered HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadingTag {
    /// An ATX or setext heading with its plain text
    Markdown { level: u8, text: String },
    /// A `<hN>` written as raw HTML
    Raw,
}

/// Heading open tags of `tree` in the order they appear in the HTML
///
/// Footnote definitions are rendered after the body, so their headings are
/// listed last.
pub fn outline(tree: &Node) -> Vec<HeadingTag> {
    let mut tags = Vec::new();
    let mut footnotes = Vec::new();
    collect(tree, &mut tags, &mut footnotes);
    for note in footnotes {
        collect_children(note, &mut tags, &mut Vec::new());
    }
    tags
}

fn collect<'a>(node: &'a Node, tags: &mut Vec<HeadingTag>, footnotes: &mut Vec<&'a Node>) {
    match node {
        Node::Heading(heading) => {
            let mut text = String::new();
            for child in &heading.children {
                plain_text(child, &mut text);
            }
            tags.push(HeadingTag::Markdown {
                level: heading.depth,
                text,
            });
        }
        Node::Html(html) => {
            tags.extend(OPEN_RE.find_iter(&html.value).map(|_| HeadingTag::Raw));
            return;
        }
        Node::FootnoteDefinition(_) => {
            footnotes.push(node);
            return;
        }
        _ => {}
    }
    collect_children(node, tags, footnotes);
}

fn collect_children<'a>(node: &'a Node, tags: &mut Vec<HeadingTag>, footnotes: &mut Vec<&'a Node>) {
    if let Some(children) = node.children() {
        for child in children {
            collect(child, tags, footnotes);
        }
    }
}

fn plain_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&text.value),
        Node::InlineCode(code) => out.push_str(&code.value),
        _ => {
            if let Some(children) = node.children() {
                for child in children {
                    plain_text(child, out);
                }
            }
        }
    }
}

/// Give every markdown heading in `html` an id of the form `<prefix>-<slug>`
///
/// `outline` lists every heading open tag of `html` in order; tags marked
/// [`HeadingTag::Raw`] are passed through untouched.
pub fn anchor_headings(html: &str, prefix: &str, outline: &[HeadingTag]) -> (String, Vec<Heading>) {
    let mut out = String::with_capacity(html.len() + 64);
    let mut headings = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut tags = outline.iter();
    let mut last = 0;

    for caps in OPEN_RE.captures_iter(html) {
        let (Some(open), Some(digit)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(HeadingTag::Markdown { level, text }) = tags.next() else {
            continue;
        };
        let close = format!("</h{}>", level);
        if open.as_str() != format!("<h{}>", level) {
            continue;
        }
        let Some(inner_len) = html[open.end()..].find(&close) else {
            continue;
        };
        let inner = &html[open.end()..open.end() + inner_len];

        let mut slug = slugify(text);
        if slug.is_empty() {
            slug = "section".to_string();
        }
        let count = seen.entry(slug.clone()).or_insert(0);
        if *count > 0 {
            slug = format!("{}-{}", slug, count);
        }
        *count += 1;
        let id = format!("{}-{}", prefix, slug);

        out.push_str(&html[last..open.start()]);
        out.push_str(&format!("<h{} id=\"{}\">", digit.as_str(), id));
        last = open.end();

        headings.push(Heading {
            level: *level,
            id,
            text: TAG_RE.replace_all(inner, "").trim().to_string(),
        });
    }
    out.push_str(&html[last..]);

    (out, headings)
}

/// Nested list of links to `headings`
///
/// Levels are relative to the shallowest heading and never deepen by more
/// than one step at a time, so the lists always nest properly.
pub fn build(headings: &[Heading]) -> String {
    let base = headings.iter().map(|h| h.level).min().unwrap_or(1);
    let mut out = String::from("<nav class=\"toc\">\n");
    let mut open = 0usize;

    for heading in headings {
        let level = ((heading.level - base) as usize + 1).min(open + 1);
        if level > open {
            out.push_str("<ul>\n");
            open = level;
        } else {
            out.push_str("</li>\n");
            while open > level {
                out.push_str("</ul>\n</li>\n");
                open -= 1;
            }
        }
        out.push_str(&format!("<li><a href=\"#{}\">{}</a>", heading.id, heading.text));
    }

    if open > 0 {
        out.push_str("</li>\n");
        while open > 1 {
            out.push_str("</ul>\n</li>\n");
            open -= 1;
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</nav>\n");
    out
}

/// Lowercase ASCII alphanumerics joined by single dashes
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if dash && !slug.is_empty() {
                slug.push('-');
            }
            dash = false;
            slug.extend(c.to_lowercase());
        } else {
            dash = true;
        }
    }
    slug
}
