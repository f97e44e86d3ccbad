//! GraphSON decoding.
//!
//! Gremlin Server answers HTTP requests in GraphSON 2/3, which wraps most
//! values as `{"@type": ..., "@value": ...}`. [`untype`] strips the wrappers
//! so the rest of the crate sees plain JSON.

use serde_json::{Map, Value};

pub fn untype(value: Value) -> Value {
    match value {
        Value::Object(mut obj) if obj.contains_key("@type") && obj.contains_key("@value") => {
            let kind = obj
                .get("@type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let inner = obj.remove("@value").unwrap_or(Value::Null);
            match kind.as_str() {
                "g:Map" => untype_map(inner),
                _ => untype(inner),
            }
        }
        Value::Object(obj) => Value::Object(
            obj.into_iter()
                .map(|(k, v)| (k, untype(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(untype).collect()),
        other => other,
    }
}

/// `g:Map` is a flat `[k1, v1, k2, v2, ...]` list.
fn untype_map(inner: Value) -> Value {
    let Value::Array(items) = inner else {
        return untype(inner);
    };
    let mut map = Map::new();
    let mut iter = items.into_iter();
    while let Some(key) = iter.next() {
        let value = iter.next().map(untype).unwrap_or(Value::Null);
        let key = match untype(key) {
            Value::String(s) => s,
            other => other.to_string(),
        };
        map.insert(key, value);
    }
    Value::Object(map)
}

/// Flatten a `valueMap()` entry: single-element lists become scalars.
pub fn flatten_value_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(obj) => obj
            .into_iter()
            .map(|(k, v)| match v {
                Value::Array(mut items) if items.len() == 1 => (k, items.remove(0)),
                other => (k, other),
            })
            .collect(),
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_untype_scalars_and_lists() {
        let raw = json!({
            "@type": "g:List",
            "@value": [
                {"@type": "g:Int64", "@value": 4144},
                {"@type": "g:Double", "@value": 1.5},
                "plain"
            ]
        });
        assert_eq!(untype(raw), json!([4144, 1.5, "plain"]));
    }

    #[test]
    fn test_untype_map() {
        let raw = json!({
            "@type": "g:Map",
            "@value": [
                "id", {"@type": "g:Int64", "@value": 8},
                "label", "Compound",
                {"@type": "g:T", "@value": "key"}, "v"
            ]
        });
        assert_eq!(untype(raw), json!({"id": 8, "label": "Compound", "key": "v"}));
    }

    #[test]
    fn test_untype_nested_relation_id() {
        let raw = json!({
            "@type": "janusgraph:RelationIdentifier",
            "@value": {"relationId": "4r-6c-36d-2o"}
        });
        assert_eq!(untype(raw), json!({"relationId": "4r-6c-36d-2o"}));
    }

    #[test]
    fn test_flatten_value_map() {
        let flat = flatten_value_map(json!({"name": ["water"], "aliases": ["a", "b"]}));
        assert_eq!(flat["name"], json!("water"));
        assert_eq!(flat["aliases"], json!(["a", "b"]));
    }
}
