//! Locating a JSON object inside free-form model output.

/// Return the first balanced top-level `{ … }` in `raw`.
///
/// Braces inside JSON strings (including escaped quotes) are ignored, so
/// prose before or after the object and code fences around it are tolerated.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object() {
        assert_eq!(extract_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn prose_and_fences_around_object() {
        let raw = "Here is the result:\n```json\n{\"score\": 70, \"x\": {\"y\": 1}}\n```\nThanks!";
        assert_eq!(
            extract_json_object(raw),
            Some("{\"score\": 70, \"x\": {\"y\": 1}}")
        );
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let raw = r#"{"feedback": "use } and \" carefully {", "score": 90} trailing }"#;
        assert_eq!(
            extract_json_object(raw),
            Some(r#"{"feedback": "use } and \" carefully {", "score": 90}"#)
        );
    }

    #[test]
    fn first_of_two_objects_wins() {
        assert_eq!(extract_json_object("{\"a\":1} {\"b\":2}"), Some("{\"a\":1}"));
    }

    #[test]
    fn no_object() {
        assert_eq!(extract_json_object("score: 70"), None);
        assert_eq!(extract_json_object("{ unterminated"), None);
    }
}
