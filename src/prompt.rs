use crate::scraper::{truncate, ScrapedPage};

/// Bumped whenever the instruction text changes; the wording is part of the output contract.
pub const PROMPT_VERSION: &str = "clone-v2";

/// Cap applied to each truncated field.
pub const DEFAULT_FIELD_CHARS: usize = 10_000;

const INSTRUCTIONS: &str = "You are recreating an existing web page as a single standalone HTML document.
Reproduce the page below as closely as possible, following these rules:
1. Keep every original image URL exactly as given and preserve image width and height.
2. Put all styling in one <style> block in the <head>; do not use inline style attributes.
3. Use only valid CSS and valid HTML; close every tag, rule and string you open.
4. If a section cannot be reconstructed, omit it entirely. Do not emit placeholder comments or TODO notes.
5. Keep the same color scheme, fonts, layout and overall design.
6. Return only the HTML document, starting with <!DOCTYPE html>. No explanations.";

/// Builds the generation prompt. Each flag cuts its field to `max_chars`.
pub fn build_prompt(
    page: &ScrapedPage,
    truncate_css: bool,
    truncate_content: bool,
    max_chars: usize,
) -> String {
    let content = if truncate_content {
        truncate(&page.content, max_chars)
    } else {
        page.content.clone()
    };
    let styles = if truncate_css {
        truncate(&page.styles, max_chars)
    } else {
        page.styles.clone()
    };

    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + content.len() + styles.len() + 64);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\n\nPAGE CONTENT (HTML):\n");
    prompt.push_str(&content);
    prompt.push_str("\n\nPAGE STYLES (CSS):\n");
    prompt.push_str(&styles);
    prompt.push('\n');
    prompt
}
