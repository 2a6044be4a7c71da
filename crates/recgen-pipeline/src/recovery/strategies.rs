//! Whole-document repair strategies, tried in order by [`super::recover_records`].

use std::sync::LazyLock;

use recgen_llm::strip_code_fences;
use regex::Regex;

use super::{parse_records, Record, RecoveryError};

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([\]}])").expect("valid regex"));
static DOUBLED_CLOSE_BEFORE_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\}(\s*\})+(\s*)\]").expect("valid regex"));

/// Strategy 1: parse the trimmed text as-is.
///
/// # Errors
///
/// Returns the parse error or [`RecoveryError::NoRecords`].
pub fn direct_parse(text: &str) -> Result<Vec<Record>, RecoveryError> {
    parse_records(text)
}

/// Strategy 2: drop leading and trailing code-fence markers, then parse.
///
/// # Errors
///
/// Returns the parse error or [`RecoveryError::NoRecords`].
pub fn strip_fences_and_parse(text: &str) -> Result<Vec<Record>, RecoveryError> {
    parse_records(strip_code_fences(text))
}

/// The outermost delimited region: from the first opening delimiter to the
/// last matching closing one. An object comes first when its `{` precedes
/// any `[`, which covers object-wrapped arrays.
fn delimited_region(text: &str) -> Option<&str> {
    let array_start = text.find('[');
    let object_start = text.find('{');
    let (start, close) = match (array_start, object_start) {
        (Some(a), Some(o)) if o < a => (o, '}'),
        (Some(a), _) => (a, ']'),
        (None, Some(o)) => (o, '}'),
        (None, None) => return None,
    };
    let end = text.rfind(close).filter(|end| *end > start)?;
    Some(&text[start..=end])
}

/// The text from the first opening delimiter to the end, for repairs that
/// must also handle truncated input.
fn from_first_opening(text: &str) -> Option<&str> {
    let start = text.find(['[', '{'])?;
    Some(&text[start..])
}

/// Strategy 3: parse the outermost `[...]` (or `{...}`) substring.
///
/// # Errors
///
/// Returns [`RecoveryError::NoDelimiters`] when no delimited region exists.
pub fn parse_delimited(text: &str) -> Result<Vec<Record>, RecoveryError> {
    let stripped = strip_code_fences(text);
    let region = delimited_region(stripped).ok_or(RecoveryError::NoDelimiters)?;
    parse_records(region)
}

/// Strategy 4: remove trailing commas before closers, then collapse doubled
/// closing braces right before a closing bracket.
///
/// # Errors
///
/// Returns the last parse error when neither repair yields records.
pub fn repair_structure(text: &str) -> Result<Vec<Record>, RecoveryError> {
    let stripped = strip_code_fences(text);
    let region = delimited_region(stripped)
        .or_else(|| from_first_opening(stripped))
        .ok_or(RecoveryError::NoDelimiters)?;

    let without_commas = TRAILING_COMMA.replace_all(region, "$1");
    match parse_records(&without_commas) {
        Ok(records) => Ok(records),
        Err(_) => {
            let collapsed = DOUBLED_CLOSE_BEFORE_BRACKET.replace_all(&without_commas, "}$2]");
            parse_records(&collapsed)
        }
    }
}

/// Strategy 5: close an open string, drop a dangling comma, and append the
/// closers for every unmatched `{` and `[`.
///
/// # Errors
///
/// Returns the parse error of the balanced text.
pub fn balance_brackets(text: &str) -> Result<Vec<Record>, RecoveryError> {
    let stripped = strip_code_fences(text);
    let region = from_first_opening(stripped).ok_or(RecoveryError::NoDelimiters)?;
    let region = TRAILING_COMMA.replace_all(region, "$1");

    let mut open: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in region.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                if open.last() == Some(&c) {
                    open.pop();
                }
            }
            _ => {}
        }
    }

    let mut balanced = region.into_owned();
    if in_string {
        if escaped {
            balanced.pop();
        }
        balanced.push('"');
    }
    let trimmed_len = balanced.trim_end().trim_end_matches(',').len();
    balanced.truncate(trimmed_len);
    balanced.extend(open.iter().rev());

    parse_records(&balanced)
}

#[cfg(test)]
#[path = "strategies_test.rs"]
mod tests;
