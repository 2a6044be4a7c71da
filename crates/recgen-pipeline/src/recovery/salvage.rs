//! Field-boundary salvage: recover array elements one at a time.
//!
//! Element starts are found with a pattern for an object opening on a key.
//! The end of each element is found by a character scan that tracks string
//! and escape state, so braces inside string values do not count.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{is_record_shaped, Record, RecoveryError};

static ELEMENT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{\s*"[A-Za-z_][A-Za-z0-9_]*"\s*:"#).expect("valid regex"));

/// Result of scanning one element from its opening brace.
#[derive(Debug, PartialEq, Eq)]
struct ScannedElement {
    /// Element text, with control characters inside strings escaped.
    text: String,
    /// Bytes of input consumed, including the closing brace when present.
    consumed: usize,
    /// Closers still open when the input ran out; empty for a complete element.
    open: Vec<char>,
    /// The input ran out inside a string.
    in_string: bool,
    /// The input ran out right after a backslash inside a string.
    escaped: bool,
    /// Length of `text` at the last member separator of the element itself.
    last_member_end: Option<usize>,
}

fn scan_element(input: &str) -> ScannedElement {
    let mut text = String::with_capacity(input.len());
    let mut open: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut last_member_end = None;

    for (idx, c) in input.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
                text.push(c);
            } else {
                match c {
                    '\\' => {
                        escaped = true;
                        text.push(c);
                    }
                    '"' => {
                        in_string = false;
                        text.push(c);
                    }
                    '\n' => text.push_str("\\n"),
                    '\r' => text.push_str("\\r"),
                    '\t' => text.push_str("\\t"),
                    c if c.is_control() => text.push(' '),
                    c => text.push(c),
                }
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => open.push('}'),
            '[' => open.push(']'),
            ',' if open.len() == 1 => last_member_end = Some(text.len()),
            '}' | ']' => {
                if open.last() == Some(&c) {
                    open.pop();
                }
            }
            _ => {}
        }
        text.push(c);

        if open.is_empty() {
            return ScannedElement {
                text,
                consumed: idx + c.len_utf8(),
                open,
                in_string: false,
                escaped: false,
                last_member_end,
            };
        }
    }

    ScannedElement {
        consumed: input.len(),
        text,
        open,
        in_string,
        escaped,
        last_member_end,
    }
}

fn parse_record(text: &str) -> Option<Record> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(obj)) if is_record_shaped(&obj) => Some(obj),
        _ => None,
    }
}

/// Close a truncated element: terminate the open string, drop a dangling
/// separator and append the missing closers.
fn close_truncated(scanned: &ScannedElement) -> String {
    let mut closed = scanned.text.clone();
    if scanned.in_string {
        if scanned.escaped {
            closed.pop();
        }
        closed.push('"');
    }
    let trimmed = closed.trim_end();
    let trimmed = trimmed.strip_suffix(',').unwrap_or(trimmed);
    let mut closed = match trimmed.strip_suffix(':') {
        Some(rest) => format!("{rest}:null"),
        None => trimmed.to_string(),
    };
    closed.extend(scanned.open.iter().rev());
    closed
}

/// Salvage a truncated element, first as-is and then cut back to its last
/// complete member.
fn salvage_truncated(scanned: &ScannedElement) -> Option<Record> {
    parse_record(&close_truncated(scanned)).or_else(|| {
        let cut = scanned.last_member_end?;
        parse_record(&format!("{}}}", &scanned.text[..cut]))
    })
}

/// Strategy 6: parse each element independently and keep those that parse.
///
/// # Errors
///
/// Returns [`RecoveryError::NothingSalvaged`] when no element is recovered.
pub fn salvage_elements(text: &str) -> Result<Vec<Record>, RecoveryError> {
    let mut records = Vec::new();
    let mut resume_at = 0;

    for start in ELEMENT_START.find_iter(text).map(|m| m.start()) {
        if start < resume_at {
            continue;
        }
        let scanned = scan_element(&text[start..]);

        let record = if scanned.open.is_empty() {
            parse_record(&scanned.text)
        } else {
            salvage_truncated(&scanned)
        };

        // An unusable span may be a wrapper object; keep scanning inside it.
        match record {
            Some(record) => {
                resume_at = start + scanned.consumed;
                records.push(record);
            }
            None => {
                tracing::debug!(offset = start, "element not recoverable, scanning inside it");
            }
        }
    }

    if records.is_empty() {
        Err(RecoveryError::NothingSalvaged)
    } else {
        Ok(records)
    }
}
