//! Field kinds and the ordered-candidate coercion of raw JSON values.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// One acceptable runtime type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Float,
    Integer,
    Bool,
    /// The "or absent" arm of an optional field. Always matches.
    Null,
}

impl FieldKind {
    /// Try to read `raw` as this kind. `None` means "not this kind".
    pub fn parse(self, raw: &Value) -> Option<Value> {
        match self {
            FieldKind::String => parse_string(raw),
            FieldKind::Float => parse_float(raw),
            FieldKind::Integer => parse_integer(raw),
            FieldKind::Bool => parse_bool(raw),
            FieldKind::Null => Some(Value::Null),
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::String => write!(f, "string"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::Null => write!(f, "null"),
        }
    }
}

/// Coerce `raw` through `candidates` in order.
///
/// The first candidate whose parser accepts the value wins. When none does,
/// the raw value is returned unchanged.
pub fn coerce(candidates: &[FieldKind], raw: &Value) -> Value {
    candidates
        .iter()
        .find_map(|kind| kind.parse(raw))
        .unwrap_or_else(|| raw.clone())
}

fn parse_string(raw: &Value) -> Option<Value> {
    match raw {
        Value::String(s) => Some(Value::String(s.clone())),
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Bool(b) => Some(Value::String(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_float(raw: &Value) -> Option<Value> {
    let f = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    // NaN and infinities have no JSON representation.
    Number::from_f64(f).map(Value::Number)
}

fn parse_integer(raw: &Value) -> Option<Value> {
    let i = match raw {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 || f < i64::MIN as f64 || f > i64::MAX as f64 {
                    return None;
                }
                f as i64
            }
        },
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Some(Value::from(i))
}

fn parse_bool(raw: &Value) -> Option<Value> {
    match raw {
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(Value::Bool(true)),
            "false" | "no" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_string_settles_into_float() {
        let v = coerce(&[FieldKind::Float, FieldKind::Null], &json!("12.5"));
        assert_eq!(v, json!(12.5));
    }

    #[test]
    fn test_null_string_falls_to_null_arm() {
        let v = coerce(&[FieldKind::Float, FieldKind::Null], &json!("null"));
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn test_string_or_null_keeps_text() {
        let v = coerce(&[FieldKind::String, FieldKind::Null], &json!("mA"));
        assert_eq!(v, json!("mA"));
        let v = coerce(&[FieldKind::String, FieldKind::Null], &Value::Null);
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn test_first_candidate_wins() {
        // "3" is both a valid string and a valid float; order decides.
        assert_eq!(coerce(&[FieldKind::String, FieldKind::Float], &json!("3")), json!("3"));
        assert_eq!(coerce(&[FieldKind::Float, FieldKind::String], &json!("3")), json!(3.0));
    }

    #[test]
    fn test_unmatched_value_passes_through() {
        let raw = json!("room temperature");
        assert_eq!(coerce(&[FieldKind::Float], &raw), raw);
        assert_eq!(coerce(&[], &raw), raw);
    }

    #[test]
    fn test_number_renders_as_string() {
        assert_eq!(coerce(&[FieldKind::String], &json!(42)), json!("42"));
    }

    #[test]
    fn test_integer_parsing() {
        assert_eq!(coerce(&[FieldKind::Integer], &json!(" 7 ")), json!(7));
        assert_eq!(coerce(&[FieldKind::Integer], &json!(4.0)), json!(4));
        assert_eq!(coerce(&[FieldKind::Integer], &json!("4.5")), json!("4.5"));
    }

    #[test]
    fn test_bool_parsing() {
        assert_eq!(coerce(&[FieldKind::Bool], &json!("Yes")), json!(true));
        assert_eq!(coerce(&[FieldKind::Bool], &json!("0")), json!(false));
        assert_eq!(coerce(&[FieldKind::Bool], &json!("maybe")), json!("maybe"));
    }

    #[test]
    fn test_non_finite_float_rejected() {
        assert_eq!(coerce(&[FieldKind::Float], &json!("NaN")), json!("NaN"));
        assert_eq!(
            coerce(&[FieldKind::Float, FieldKind::Null], &json!("inf")),
            Value::Null
        );
    }

    #[test]
    fn test_coercion_is_deterministic() {
        let kinds = [FieldKind::Float, FieldKind::String, FieldKind::Null];
        for raw in [json!("1e3"), json!("abc"), Value::Null, json!(true)] {
            let first = coerce(&kinds, &raw);
            for _ in 0..5 {
                assert_eq!(coerce(&kinds, &raw), first);
            }
        }
    }
}
