//! Typographic punctuation for rendered HTML text
//!
//! Only text between tags is rewritten, and never inside elements whose
//! content is literal (code, pre, kbd, script, style). Links whose text is
//! their own target (autolinks) are copied as is.

const LITERAL_TAGS: &[&str] = &["code", "pre", "kbd", "script", "style"];

/// Apply smart punctuation to the text content of `html`
pub fn apply(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut literal_depth = 0usize;
    let mut prev = ' ';
    let mut rest = html;

    while !rest.is_empty() {
        if rest.starts_with("<!--") {
            let end = rest.find("-->").map_or(rest.len(), |i| i + 3);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
        } else if let Some(end) = autolink_len(rest) {
            out.push_str(&rest[..end]);
            prev = 'a';
            rest = &rest[end..];
        } else if rest.starts_with('<') {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            let tag = &rest[..end];
            track_literal(tag, &mut literal_depth);
            out.push_str(tag);
            rest = &rest[end..];
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            let text = &rest[..end];
            if literal_depth == 0 {
                transform_text(text, &mut prev, &mut out);
            } else {
                out.push_str(text);
            }
            rest = &rest[end..];
        }
    }
    out
}

/// Length of a leading `<a href="X">X</a>` (or `mailto:X`), if `html` starts with one
fn autolink_len(html: &str) -> Option<usize> {
    if !html.starts_with("<a ") {
        return None;
    }
    let open_end = html.find('>')? + 1;
    let href = href_of(&html[..open_end])?;
    let text_len = html[open_end..].find("</a>")?;
    let text = &html[open_end..open_end + text_len];
    if text == href || href.strip_prefix("mailto:") == Some(text) {
        Some(open_end + text_len + "</a>".len())
    } else {
        None
    }
}

fn href_of(tag: &str) -> Option<&str> {
    let start = tag.find("href=\"")? + "href=\"".len();
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len])
}

fn track_literal(tag: &str, depth: &mut usize) {
    let inner = tag.trim_start_matches('<').trim_end_matches('>');
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if !LITERAL_TAGS.contains(&name.as_str()) {
        return;
    }
    if closing {
        *depth = depth.saturating_sub(1);
    } else if !inner.ends_with('/') {
        *depth += 1;
    }
}

fn transform_text(text: &str, prev: &mut char, out: &mut String) {
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if let Some((replacement, consumed)) = substitution(rest, *prev) {
            out.push_str(replacement);
            *prev = replacement.chars().last().unwrap_or(*prev);
            i += consumed;
            continue;
        }
        let Some(c) = rest.chars().next() else {
            break;
        };
        out.push(c);
        *prev = c;
        i += c.len_utf8();
    }
}

fn substitution(rest: &str, prev: char) -> Option<(&'static str, usize)> {
    if rest.starts_with("---") {
        return Some(("\u{2014}", 3));
    }
    if rest.starts_with("--") {
        return Some(("\u{2013}", 2));
    }
    if rest.starts_with("...") {
        return Some(("\u{2026}", 3));
    }
    if rest.starts_with("&quot;") {
        return Some((double_quote(prev), 6));
    }
    if rest.starts_with('"') {
        return Some((double_quote(prev), 1));
    }
    if rest.starts_with('\'') || rest.starts_with("&#39;") {
        let len = if rest.starts_with('\'') { 1 } else { 5 };
        return Some((if opens_quote(prev) { "\u{2018}" } else { "\u{2019}" }, len));
    }
    for (pattern, symbol) in [("(c)", "\u{a9}"), ("(r)", "\u{ae}"), ("(tm)", "\u{2122}")] {
        if rest.get(..pattern.len()).is_some_and(|s| s.eq_ignore_ascii_case(pattern)) {
            return Some((symbol, pattern.len()));
        }
    }
    if !is_word(prev) {
        for (pattern, glyph) in [("1/2", "\u{bd}"), ("1/4", "\u{bc}"), ("3/4", "\u{be}")] {
            if rest.starts_with(pattern) && !rest[pattern.len()..].chars().next().is_some_and(is_word) {
                return Some((glyph, pattern.len()));
            }
        }
    }
    None
}

fn double_quote(prev: char) -> &'static str {
    if opens_quote(prev) { "\u{201c}" } else { "\u{201d}" }
}

fn opens_quote(prev: char) -> bool {
    prev.is_whitespace() || matches!(prev, '(' | '[' | '{' | '\u{2013}' | '\u{2014}' | '-')
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '/'
}
