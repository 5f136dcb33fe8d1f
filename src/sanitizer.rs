//! Pulls HTML out of free-form model answers and patches common breakage.
//!
//! The repairs are regex heuristics, not a parser. They never fail: the worst
//! case is an output that still carries the defect it was meant to fix. Quote
//! normalization in particular is imprecise on nested or escaped quotes.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Base64 runs at least this long are treated as leaked payloads.
pub const MAX_BASE64_RUN: usize = 1000;

/// `url(...)` arguments longer than this are dropped with their declaration.
pub const MAX_URL_ARG: usize = 1000;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+.-]*)[ \t]*\r?\n?(.*?)```").expect("Failed to compile fence regex")
});

static HTML_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(?:<!doctype[^>]*>\s*)?<html\b.*?</html\s*>").expect("Failed to compile html span regex")
});

static DATA_IMAGE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)url\(\s*['"]?\s*data:image[^)]*\)"#).expect("Failed to compile data url regex")
});

static STYLE_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<style\b[^<>\n]*>?").expect("Failed to compile style open regex")
});

static STYLE_CLOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</style\s*>").expect("Failed to compile style close regex")
});

static URL_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-z-]+\s*:[^;{}<>]*?url\(([^)]*)\)[^;{}<>]*;?").expect("Failed to compile url declaration regex")
});

static URL_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)url\(([^)]*)\)").expect("Failed to compile url reference regex")
});

static SMART_QUOTED_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*[“”„″]([^“”„″"<>]*)[“”„″"]"#)
        .expect("Failed to compile smart quote regex")
});

static MISMATCHED_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)=(["'])([^"'<>\n]*)(["'])([\s/>])"#).expect("Failed to compile attribute regex")
});

/// Picks the HTML out of a model answer: a fenced block, else the first
/// `<html>…</html>` span, else the whole text. Always trimmed.
///
/// Among fences an `html` tag wins, then an untagged fence, then the first of any
/// language. The info string is never part of the result.
pub fn extract_html(raw: &str) -> String {
    if let Some(block) = pick_fenced_block(raw) {
        return block.trim().to_string();
    }

    if let Some(span) = HTML_SPAN.find(raw) {
        return span.as_str().trim().to_string();
    }

    raw.trim().to_string()
}

fn pick_fenced_block(raw: &str) -> Option<&str> {
    let blocks: Vec<(&str, &str)> = FENCED_BLOCK
        .captures_iter(raw)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .collect();

    blocks
        .iter()
        .find(|(lang, _)| lang.eq_ignore_ascii_case("html"))
        .or_else(|| blocks.iter().find(|(lang, _)| lang.is_empty()))
        .or_else(|| blocks.first())
        .map(|(_, body)| *body)
}

/// Applies every repair in a fixed order. Never fails.
pub fn clean_html(html: &str) -> String {
    let cleaned = strip_data_image_urls(html);
    let cleaned = strip_base64_runs(&cleaned);
    let cleaned = normalize_unclosed_style(&cleaned);
    let cleaned = strip_long_url_declarations(&cleaned);
    normalize_attribute_quotes(&cleaned)
}

fn strip_data_image_urls(html: &str) -> String {
    DATA_IMAGE_URL.replace_all(html, "").into_owned()
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')
}

fn strip_base64_runs(html: &str) -> String {
    let mut output = String::with_capacity(html.len());
    let mut run_start: Option<usize> = None;

    for (idx, c) in html.char_indices() {
        match (is_base64_char(c), run_start) {
            (true, None) => run_start = Some(idx),
            (false, Some(start)) => {
                if idx - start < MAX_BASE64_RUN {
                    output.push_str(&html[start..idx]);
                }
                run_start = None;
                output.push(c);
            }
            (false, None) => output.push(c),
            (true, Some(_)) => {}
        }
    }

    if let Some(start) = run_start
        && html.len() - start < MAX_BASE64_RUN
    {
        output.push_str(&html[start..]);
    }

    output
}

/// Rewrites `<style ...>` openings that have no `</style>` after them to a bare `<style>`.
fn normalize_unclosed_style(html: &str) -> String {
    let last_close = STYLE_CLOSE.find_iter(html).last().map(|m| m.end()).unwrap_or(0);

    STYLE_OPEN
        .replace_all(html, |caps: &Captures| {
            let m = caps.get(0).map(|m| (m.start(), m.as_str())).unwrap_or((0, ""));
            if m.0 >= last_close {
                "<style>".to_string()
            } else {
                m.1.to_string()
            }
        })
        .into_owned()
}

fn strip_long_url_declarations(html: &str) -> String {
    let without_declarations = URL_DECLARATION.replace_all(html, |caps: &Captures| {
        if caps.get(1).is_some_and(|arg| arg.as_str().len() > MAX_URL_ARG) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });

    URL_REFERENCE
        .replace_all(&without_declarations, |caps: &Captures| {
            if caps.get(1).is_some_and(|arg| arg.as_str().len() > MAX_URL_ARG) {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Straightens typographic quotes around attribute values and fixes
/// `name="value'` mismatches where the closing quote ends the attribute.
fn normalize_attribute_quotes(html: &str) -> String {
    let straightened = SMART_QUOTED_ATTR.replace_all(html, r#"$1="$2""#);

    MISMATCHED_ATTR
        .replace_all(&straightened, |caps: &Captures| {
            if caps[2] == caps[4] {
                caps[0].to_string()
            } else {
                format!(r#"{}="{}"{}"#, &caps[1], &caps[3], &caps[5])
            }
        })
        .into_owned()
}
