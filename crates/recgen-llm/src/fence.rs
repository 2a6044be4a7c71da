//! Markdown code-fence stripping for backend output.

/// Remove a leading ```` ``` ```` / ```` ```json ```` fence line and a trailing
/// ```` ``` ```` fence, if present. Text without fences is returned trimmed.
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string (e.g. `json`) up to the end of the fence line.
        text = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }

    let trimmed = text.trim_end();
    if let Some(rest) = trimmed.strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_only_trimmed() {
        assert_eq!(strip_code_fences("  [1, 2]\n"), "[1, 2]");
    }

    #[test]
    fn json_fence_is_removed() {
        assert_eq!(strip_code_fences("```json\n[{\"a\": 1}]\n```"), "[{\"a\": 1}]");
    }

    #[test]
    fn bare_fence_is_removed() {
        assert_eq!(strip_code_fences("```\n{}\n```  "), "{}");
    }

    #[test]
    fn unterminated_fence_keeps_body() {
        assert_eq!(strip_code_fences("```json\n[{\"a\": 1"), "[{\"a\": 1");
    }

    #[test]
    fn single_line_fence() {
        assert_eq!(strip_code_fences("```json[1]```"), "[1]");
    }
}
