//! Lenient JSON parsing for model output.
//!
//! A strict parse is always tried first. When it fails, a fixed series of
//! repairs is attempted:
//!
//! 1. cut the document out of surrounding prose (`Here you go: {...} Thanks`)
//! 2. strip `//` line comments outside strings
//! 3. drop trailing commas before `}` / `]`
//!
//! A document that stops before its closers is never completed: a reply cut
//! off mid-value would otherwise parse with the wrong value (`12` read as `1`).
//!
//! If nothing parses, the error from the strict attempt is returned so the
//! caller reports what was actually wrong with the text.

use serde_json::Value;

/// Parse `input`, repairing common model mistakes.
pub fn parse_lenient(input: &str) -> Result<Value, serde_json::Error> {
    let strict_err = match serde_json::from_str(input) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };
    repair_json(input).ok_or(strict_err)
}

/// Best-effort repair. Returns `None` when the text cannot be salvaged.
pub fn repair_json(input: &str) -> Option<Value> {
    let candidate = extract_document(input).unwrap_or(input);
    if let Ok(v) = serde_json::from_str(candidate) {
        return Some(v);
    }

    let cleaned = strip_trailing_commas(&strip_line_comments(candidate));
    serde_json::from_str(&cleaned).ok()
}

/// Slice from the first `{` or `[` through the last matching closer kind.
fn extract_document(input: &str) -> Option<&str> {
    let start = input.find(['{', '['])?;
    let closer = if input[start..].starts_with('{') {
        '}'
    } else {
        ']'
    };
    match input.rfind(closer) {
        Some(end) if end > start => Some(&input[start..=end]),
        _ => None,
    }
}

/// Remove `//` comments that sit outside string literals.
fn strip_line_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut scanner = StringScanner::default();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if !scanner.in_string && ch == '/' && chars.peek() == Some(&'/') {
            for c in chars.by_ref() {
                if c == '\n' {
                    out.push('\n');
                    break;
                }
            }
            continue;
        }
        scanner.feed(ch);
        out.push(ch);
    }
    out
}

/// Drop commas whose next non-whitespace character closes a container.
fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut scanner = StringScanner::default();

    for (i, &ch) in chars.iter().enumerate() {
        if !scanner.in_string && ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        scanner.feed(ch);
        out.push(ch);
    }
    out
}

/// Tracks whether a character stream is inside a JSON string literal.
#[derive(Default)]
struct StringScanner {
    in_string: bool,
    escaped: bool,
}

impl StringScanner {
    fn feed(&mut self, ch: char) {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == '"' {
                self.in_string = false;
            }
        } else if ch == '"' {
            self.in_string = true;
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_json_passes_through() {
        let v = parse_lenient(r#"{"type": "CHECKOUT"}"#).unwrap();
        assert_eq!(v["type"], "CHECKOUT");
    }

    #[test]
    fn document_inside_prose() {
        let v = parse_lenient(r#"Sure! Here it is: {"type": "CLEAR_BILL"} Let me know."#).unwrap();
        assert_eq!(v["type"], "CLEAR_BILL");
    }

    #[test]
    fn array_inside_prose() {
        let v = parse_lenient(r#"I can see: [{"productId": "p1"}] in the photo"#).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 1);
    }

    #[test]
    fn trailing_comma_object_and_array() {
        let v = parse_lenient(r#"{"items": [1, 2, 3,], "n": 1,}"#).unwrap();
        assert_eq!(v["items"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn line_comments_stripped() {
        let input = r#"{
            "type": "ADD_ITEM", // adding rice
            "productId": "p1"
        }"#;
        let v = parse_lenient(input).unwrap();
        assert_eq!(v["productId"], "p1");
    }

    #[test]
    fn truncated_document_is_rejected() {
        assert!(parse_lenient(r#"[{"productId": "p1", "quantity": 1"#).is_err());
        assert!(parse_lenient(r#"{"type": "ADD_ITEM", "productId": "p1", "quantity": 1"#).is_err());
        assert!(parse_lenient(r#"{"stockPrediction": "Rice will run out"#).is_err());
        assert!(repair_json(r#"Here: {"items": [{"productId": "p1"}"#).is_none());
    }

    #[test]
    fn truncated_after_trailing_comma_is_rejected() {
        assert!(parse_lenient(r#"[{"productId": "p1", "quantity": 2},"#).is_err());
    }

    #[test]
    fn comment_and_comma_inside_string_preserved() {
        let v = parse_lenient(r#"{"url": "http://x.test/a // b", "msg": "a, }"}"#).unwrap();
        assert_eq!(v["url"], "http://x.test/a // b");
        assert_eq!(v["msg"], "a, }");
    }

    #[test]
    fn escaped_quote_inside_string() {
        let v = parse_lenient(r#"{"name": "5\" pipe", }"#).unwrap();
        assert_eq!(v["name"], "5\" pipe");
    }

    #[test]
    fn irreparable_returns_strict_error() {
        assert!(parse_lenient("not json at all").is_err());
        assert!(parse_lenient("").is_err());
        assert!(repair_json("Sorry, I cannot see any products.").is_none());
    }

    #[test]
    fn bare_scalars_still_parse() {
        assert_eq!(parse_lenient("null").unwrap(), Value::Null);
        assert_eq!(parse_lenient("42").unwrap(), 42);
    }
}
