//! Best-effort structured extraction from model output
//!
//! Models wrap JSON in prose or markdown fences. [`extract_json`] returns the
//! first balanced `{...}` or `[...]` span that parses as JSON. Truncated output
//! is reported, never repaired.

use serde::de::IgnoredAny;

use crate::{Error, Result};

enum Scan {
    /// Span length in bytes, including both delimiters
    Balanced(usize),
    Mismatched,
    Truncated,
}

/// First well-formed JSON object or array in `raw`
///
/// # Errors
///
/// [`Error::NoJsonFound`] when no candidate parses. The reason says whether the
/// output looked truncated.
///
/// # Examples
///
/// ```rust
/// use vidpath_gateway::llm::extract::extract_json;
///
/// let raw = "Here you go:\n```json\n{\"steps\": []}\n```";
/// assert_eq!(extract_json(raw).unwrap(), "{\"steps\": []}");
/// ```
pub fn extract_json(raw: &str) -> Result<&str> {
    let mut truncated = false;

    if let Some(body) = fenced_body(raw) {
        match first_json(body) {
            Ok(found) => return Ok(found),
            Err(t) => truncated |= t,
        }
    }

    match first_json(raw) {
        Ok(found) => Ok(found),
        Err(t) if t || truncated => Err(Error::no_json(
            "output ends before its JSON is closed (truncated)",
        )),
        Err(_) => Err(Error::no_json("output contains no JSON object or array")),
    }
}

/// Ok(span) or Err(saw a truncated candidate)
fn first_json(text: &str) -> std::result::Result<&str, bool> {
    let mut truncated = false;
    let mut from = 0;

    while let Some(offset) = text[from..].find(['{', '[']) {
        let open = from + offset;
        match scan(&text[open..]) {
            Scan::Balanced(len) => {
                let candidate = &text[open..open + len];
                if serde_json::from_str::<IgnoredAny>(candidate).is_ok() {
                    return Ok(candidate);
                }
            }
            Scan::Truncated => truncated = true,
            Scan::Mismatched => {}
        }
        from = open + 1;
    }

    Err(truncated)
}

/// Walks one delimited span starting at `text[0]`, skipping string contents
fn scan(text: &str) -> Scan {
    let mut closers = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => closers.push(b'}'),
            b'[' => closers.push(b']'),
            b'}' | b']' => {
                if closers.pop() != Some(b) {
                    return Scan::Mismatched;
                }
                if closers.is_empty() {
                    return Scan::Balanced(i + 1);
                }
            }
            _ => {}
        }
    }

    Scan::Truncated
}

/// Contents of the first markdown code fence, language tag removed
fn fenced_body(raw: &str) -> Option<&str> {
    let start = raw.find("```")? + 3;
    let after = &raw[start..];
    let body_start = after.find('\n').map_or(after.len(), |i| i + 1);
    let body = &after[body_start..];
    Some(body.find("```").map_or(body, |end| &body[..end]))
}
