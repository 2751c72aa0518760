//! Strip code-fence wrapping from model responses.
//!
//! Models often wrap structured output in a fenced block (```` ```json ````
//! ... ```` ``` ````) even when asked for the raw document. This module removes
//! the wrapping markers so the validator sees only the document.
//!
//! Text with no marker at either end is returned byte-for-byte unchanged,
//! surrounding whitespace included. Fenced text is unwrapped and trimmed.
//! Nested wrappers are peeled until neither end carries a marker, which keeps
//! `sanitize(sanitize(x)) == sanitize(x)` for every input.

const FENCE: &str = "```";

/// Main entry point.
pub fn sanitize(text: &str) -> String {
    if !is_fenced(text) {
        return text.to_string();
    }

    let mut current = text.trim();
    loop {
        let unwrapped = strip_trailing_fence(strip_leading_fence(current)).trim();
        if unwrapped.len() == current.len() {
            break;
        }
        current = unwrapped;
    }
    current.to_string()
}

/// Whether either end of `text` (ignoring whitespace) carries a fence marker.
pub fn is_fenced(text: &str) -> bool {
    text.trim_start().starts_with(FENCE) || text.trim_end().ends_with(FENCE)
}

/// Remove one opening marker and the format name that may follow it
/// (```` ```json ````, ```` ```JSON ````, ```` ``` ````).
fn strip_leading_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix(FENCE) else {
        return text;
    };

    let name_len = rest
        .find(|c: char| !is_format_name_char(c))
        .unwrap_or(rest.len());
    if name_len == 0 {
        return rest;
    }

    // Only treat the word as a format name when it is followed by a line
    // break, whitespace, the end of input, or the start of a document.
    // "```Sure, here you go" keeps its first word.
    match rest[name_len..].chars().next() {
        None => &rest[name_len..],
        Some(c) if c.is_whitespace() || c == '{' || c == '[' => &rest[name_len..],
        Some(_) => rest,
    }
}

/// Remove one closing marker.
fn strip_trailing_fence(text: &str) -> &str {
    text.strip_suffix(FENCE).unwrap_or(text)
}

fn is_format_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')
}
