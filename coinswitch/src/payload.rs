//! Helpers shared by the response parsers.
//!
//! Pool and ticker APIs are loosely typed: numbers sometimes arrive as
//! strings, and failures are reported in-band through an `error` field on an
//! otherwise successful response.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// JavaScript-style truthiness of a JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Fail if the response carries a truthy top-level `error` field.
pub fn reject_error_field(body: &Value) -> Result<()> {
    match body.get("error") {
        Some(err) if is_truthy(err) => Err(Error::MalformedResponse(format!(
            "API response error: {}",
            err
        ))),
        _ => Ok(()),
    }
}

/// Decode a checked response body into a dialect's typed shape.
pub fn decode<T: DeserializeOwned>(body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| Error::MalformedResponse(e.to_string()))
}

/// A required numeric field: present and non-zero.
pub fn required(value: Option<f64>, field: &str) -> Result<f64> {
    value
        .filter(|v| *v != 0.0 && v.is_finite())
        .ok_or_else(|| Error::MalformedResponse(format!("missing {}", field)))
}

/// Interpret a JSON value as a number, accepting numeric strings.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Walk a dotted path (`"ticker.last"`) into a JSON document.
///
/// An empty path addresses the document itself.
pub fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(body);
    }
    path.split('.').try_fold(body, |node, key| match node {
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => node.get(key),
    })
}

/// Deserialize an optional number that may be encoded as a string.
///
/// Use with `#[serde(default, deserialize_with = "lenient_f64")]`.
pub fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => as_number(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a number, got {}", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("boom")));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_reject_error_field() {
        assert!(reject_error_field(&json!({"price": 1})).is_ok());
        assert!(reject_error_field(&json!({"error": null, "price": 1})).is_ok());
        assert!(reject_error_field(&json!({"error": ""})).is_ok());

        let err = reject_error_field(&json!({"error": "not found"})).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_required() {
        assert_eq!(required(Some(5.0), "x").unwrap(), 5.0);
        assert!(required(Some(0.0), "x").is_err());
        assert!(required(None, "x").is_err());
        assert!(required(Some(f64::NAN), "x").is_err());
    }

    #[test]
    fn test_lookup() {
        let body = json!({"ticker": {"last": "0.0123"}, "pairs": [{"p": 2}], "price": 7});
        assert_eq!(lookup(&body, "price"), Some(&json!(7)));
        assert_eq!(lookup(&body, "ticker.last"), Some(&json!("0.0123")));
        assert_eq!(lookup(&body, "pairs.0.p"), Some(&json!(2)));
        assert_eq!(lookup(&body, "ticker.bid"), None);
        assert_eq!(lookup(&json!(3.5), ""), Some(&json!(3.5)));
    }

    #[test]
    fn test_lenient_f64() {
        #[derive(Deserialize)]
        struct Sample {
            #[serde(default, deserialize_with = "lenient_f64")]
            value: Option<f64>,
        }

        let decode = |v: Value| serde_json::from_value::<Sample>(v).map(|p| p.value);
        assert_eq!(decode(json!({"value": 12})).unwrap(), Some(12.0));
        assert_eq!(decode(json!({"value": "1533000000000"})).unwrap(), Some(1533000000000.0));
        assert_eq!(decode(json!({"value": null})).unwrap(), None);
        assert_eq!(decode(json!({})).unwrap(), None);
        assert!(decode(json!({"value": "abc"})).is_err());
    }
}
