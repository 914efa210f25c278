//! Plain-text helpers for payload extraction.

/// Shortest paragraph worth keeping.
pub const MIN_PARAGRAPH_CHARS: usize = 40;

/// Smallest payload the Wikipedia extractor aims for.
pub const MIN_PAYLOAD_CHARS: usize = 120;

/// Payload used when nothing survives filtering.
pub const NO_DESCRIPTION: &str = "No description found.";

/// Whether a paragraph is boilerplate rather than prose.
#[must_use]
pub fn is_noise_paragraph(paragraph: &str) -> bool {
    let p = paragraph.trim();
    if p.chars().count() < MIN_PARAGRAPH_CHARS {
        return true;
    }
    if (p.starts_with('(') && p.ends_with(')')) || (p.starts_with('[') && p.ends_with(']')) {
        return true;
    }
    if p.starts_with("Coordinates") || p.starts_with('•') {
        return true;
    }
    p.chars()
        .all(|c| c.is_ascii_digit() || c.is_whitespace() || c.is_ascii_punctuation())
}

/// Join the leading prose paragraphs of `text` until `target` characters.
///
/// Returns [`NO_DESCRIPTION`] when every paragraph is noise.
#[must_use]
pub fn extract_paragraphs(text: &str, target: usize) -> String {
    let target = target.max(MIN_PAYLOAD_CHARS);
    let mut kept: Vec<&str> = Vec::new();
    let mut len = 0;
    for paragraph in text.lines().map(str::trim).filter(|p| !p.is_empty()) {
        if is_noise_paragraph(paragraph) {
            continue;
        }
        kept.push(paragraph);
        len += paragraph.chars().count();
        if len >= target {
            break;
        }
    }
    if kept.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        kept.join("\n\n")
    }
}

/// Cut `text` to `max` characters, appending `...` when shortened.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
