//! Extraction of the ```json fenced block from a model answer.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// First ```json block; an unterminated block runs to end of text.
static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```json(.*?)(?:```|\z)").expect("valid regex"));

/// Body of the first ```json block, trimmed.
pub fn extract_json_block(text: &str) -> Option<&str> {
    JSON_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Parse the fenced block into a list of raw items.
///
/// A top-level object counts as a one-item list. Anything else, including
/// an empty list, yields `None`.
pub fn parse_items(text: &str) -> Option<Vec<Value>> {
    let block = extract_json_block(text)?;
    match serde_json::from_str::<Value>(block) {
        Ok(Value::Array(items)) if !items.is_empty() => Some(items),
        Ok(obj @ Value::Object(_)) => Some(vec![obj]),
        Ok(_) => None,
        Err(e) => {
            debug!("Malformed JSON block: {}", e);
            None
        }
    }
}

/// Read a turn file and extract its items. Unreadable files yield `None`.
pub fn read_and_clean_file(path: &Path) -> Option<Vec<Value>> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_items(&text),
        Err(e) => {
            debug!("Cannot read {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_first_block() {
        let text = "Here you go:\n```json\n[{\"a\": 1}]\n```\nand another\n```json\n[2]\n```";
        assert_eq!(extract_json_block(text), Some("[{\"a\": 1}]"));
    }

    #[test]
    fn test_unterminated_block_runs_to_end() {
        assert_eq!(parse_items("```json\n[1, 2]\n"), Some(vec![json!(1), json!(2)]));
    }

    #[test]
    fn test_object_is_single_item() {
        let items = parse_items("```json {\"label\": \"x\"} ```").unwrap();
        assert_eq!(items, vec![json!({"label": "x"})]);
    }

    #[test]
    fn test_rejections() {
        assert!(parse_items("[1, 2]").is_none(), "no fence");
        assert!(parse_items("```json\n[1, 2\n```").is_none(), "malformed");
        assert!(parse_items("```json\n[]\n```").is_none(), "empty");
        assert!(parse_items("```json\n\"text\"\n```").is_none(), "scalar");
        assert!(parse_items("```python\n[1]\n```").is_none(), "other language");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_and_clean_file(&dir.path().join("nope.json")).is_none());
    }
}
