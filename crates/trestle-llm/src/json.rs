//! Recovery of JSON objects from noisy LLM output
//!
//! Models asked for strict JSON still wrap it in prose or markdown
//! fences often enough that the gateway tries three parses in order:
//! the raw content, the body of a fenced code block, and the first
//! balanced `{...}` span anywhere in the content.

use serde_json::Value;
use tracing::debug;

/// Recover a JSON value from raw model output.
///
/// Returns `None` only when none of the three strategies yields
/// parseable JSON.
pub fn recover_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if let Some(block) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(block.trim()) {
            debug!("recovered JSON from fenced code block");
            return Some(value);
        }
    }

    if let Some(span) = balanced_object(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            debug!("recovered JSON from balanced object span");
            return Some(value);
        }
    }

    None
}

/// Extract the body of the first ``` fenced block, tolerating an
/// optional language tag on the opening fence.
fn fenced_block(content: &str) -> Option<&str> {
    let start = content.find("```")?;
    let after_fence = &content[start + 3..];
    // Skip the rest of the opening fence line ("json", "JSON", nothing).
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// Find the first balanced `{...}` span, respecting string literals
/// and escapes.
fn balanced_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..start + offset + 1]);
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
    use serde_json::json;

    #[test]
    fn test_direct_parse() {
        let value = recover_json(r#"{"summary": "ok", "entities": []}"#).unwrap();
        assert_eq!(value["summary"], json!("ok"));
    }

    #[test]
    fn test_fenced_block_with_language_tag() {
        let content = "Here is the result:\n```json\n{\"summary\": \"fenced\"}\n```\nDone.";
        let value = recover_json(content).unwrap();
        assert_eq!(value["summary"], json!("fenced"));
    }

    #[test]
    fn test_fenced_block_without_language_tag() {
        let content = "```\n{\"summary\": \"plain fence\"}\n```";
        let value = recover_json(content).unwrap();
        assert_eq!(value["summary"], json!("plain fence"));
    }

    #[test]
    fn test_balanced_span_in_prose() {
        let content = r#"The model says: {"entities": [{"id": "e1"}]} and then rambles on."#;
        let value = recover_json(content).unwrap();
        assert_eq!(value["entities"][0]["id"], json!("e1"));
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_scanner() {
        let content = r#"noise {"note": "a { b } c", "n": 1} trailing"#;
        let value = recover_json(content).unwrap();
        assert_eq!(value["n"], json!(1));
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let content = r#"x {"quote": "she said \"{\"", "ok": true} y"#;
        let value = recover_json(content).unwrap();
        assert_eq!(value["ok"], json!(true));
    }

    #[test]
    fn test_no_json_anywhere() {
        assert!(recover_json("no structured output here").is_none());
        assert!(recover_json("").is_none());
        assert!(recover_json("{ unbalanced").is_none());
    }
}
