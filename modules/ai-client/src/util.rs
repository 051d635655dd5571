/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip markdown code blocks from a response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Close a payload shaped like `{"key": [{..}, {..}, {..` that was cut off
/// mid-array, keeping every element that was emitted in full.
///
/// Returns `None` when the input never opened an array.
pub fn close_truncated_array(json: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut array_open: Option<usize> = None;
    let mut last_complete: Option<usize> = None;

    for (i, c) in json.char_indices() {
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
            '{' => depth += 1,
            '[' => {
                depth += 1;
                if depth == 2 && array_open.is_none() {
                    array_open = Some(i);
                }
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if c == '}' && depth == 2 {
                    last_complete = Some(i + 1);
                }
            }
            _ => {}
        }
    }

    let cut = last_complete.or_else(|| array_open.map(|i| i + 1))?;
    Some(format!("{}]}}", &json[..cut]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_char_boundary() {
        let text = "Hello 世界";
        let truncated = truncate_to_char_boundary(text, 8);
        assert!(truncated.len() <= 8);
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("{}"), "{}");
    }

    #[test]
    fn closes_array_after_last_complete_element() {
        let cut = r#"{"contacts":[{"name":"a"},{"name":"b"},{"na"#;
        assert_eq!(
            close_truncated_array(cut).unwrap(),
            r#"{"contacts":[{"name":"a"},{"name":"b"}]}"#
        );
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let cut = r#"{"contacts":[{"name":"}{"},{"name":"x\"}"#;
        assert_eq!(
            close_truncated_array(cut).unwrap(),
            r#"{"contacts":[{"name":"}{"}]}"#
        );
    }

    #[test]
    fn empty_array_when_no_element_finished() {
        let cut = r#"{"contacts":[{"name":"#;
        assert_eq!(close_truncated_array(cut).unwrap(), r#"{"contacts":[]}"#);
    }

    #[test]
    fn no_array_means_nothing_to_repair() {
        assert!(close_truncated_array(r#"{"name":"a""#).is_none());
    }
}
