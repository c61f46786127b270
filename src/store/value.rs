//! Firestore value codec
//!
//! Converts between plain JSON and Firestore's typed value encoding, where
//! every value is an object with a single kind key such as `stringValue` or
//! `mapValue`.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Number, Value};

use super::{Document, Fields};
use crate::error::{AppError, Result};

// == Encode ==
/// Encodes a JSON value as a Firestore value.
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // int64 travels as a decimal string
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            if items.is_empty() {
                json!({ "arrayValue": {} })
            } else {
                let values: Vec<Value> = items.iter().map(encode).collect();
                json!({ "arrayValue": { "values": values } })
            }
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encodes a field map.
pub fn encode_fields(fields: &Fields) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), encode(v)))
        .collect();
    Value::Object(encoded)
}

// == Decode ==
/// Decodes a Firestore value into plain JSON.
pub fn decode(value: &Value) -> Result<Value> {
    let object = value
        .as_object()
        .ok_or_else(|| AppError::Upstream(format!("expected a typed value, got {}", value)))?;
    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| AppError::Upstream("empty typed value".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| malformed(kind, inner)),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(|i| Value::Number(i.into()))
                .ok_or_else(|| malformed(kind, inner))
        }
        "doubleValue" => match inner {
            Value::Number(n) => Ok(Value::Number(n.clone())),
            // "NaN", "Infinity" and "-Infinity" have no JSON form
            Value::String(_) => Ok(Value::Null),
            _ => Err(malformed(kind, inner)),
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| malformed(kind, inner)),
        "geoPointValue" => {
            let coord = |name: &str| {
                inner
                    .get(name)
                    .and_then(Value::as_f64)
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::Number(0.into()))
            };
            Ok(json!({ "latitude": coord("latitude"), "longitude": coord("longitude") }))
        }
        "arrayValue" => match inner.get("values") {
            None => Ok(Value::Array(Vec::new())),
            Some(Value::Array(items)) => items
                .iter()
                .map(decode)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Some(other) => Err(malformed(kind, other)),
        },
        "mapValue" => match inner.get("fields") {
            None => Ok(Value::Object(Map::new())),
            Some(fields) => decode_fields(fields).map(Value::Object),
        },
        other => Err(AppError::Upstream(format!("unsupported value kind '{}'", other))),
    }
}

/// Decodes a `fields` object.
pub fn decode_fields(fields: &Value) -> Result<Fields> {
    let object = fields
        .as_object()
        .ok_or_else(|| AppError::Upstream("fields is not an object".to_string()))?;
    object
        .iter()
        .map(|(k, v)| decode(v).map(|decoded| (k.clone(), decoded)))
        .collect()
}

/// Decodes a Firestore document resource.
pub fn decode_document(resource: &Value) -> Result<Document> {
    let name = resource
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Upstream("document without a name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();

    let fields = match resource.get("fields") {
        Some(fields) => decode_fields(fields)?,
        None => Fields::new(),
    };

    Ok(Document {
        id,
        fields,
        create_time: parse_time(resource.get("createTime")),
        update_time: parse_time(resource.get("updateTime")),
    })
}

fn parse_time(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn malformed(kind: &str, inner: &Value) -> AppError {
    AppError::Upstream(format!("malformed {}: {}", kind, inner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&json!(null)), json!({ "nullValue": null }));
        assert_eq!(encode(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(encode(&json!(42)), json!({ "integerValue": "42" }));
        assert_eq!(encode(&json!(0.5)), json!({ "doubleValue": 0.5 }));
        assert_eq!(encode(&json!("C")), json!({ "stringValue": "C" }));
    }

    #[test]
    fn test_encode_nested() {
        let encoded = encode(&json!({ "notes": ["C", 1], "empty": [] }));
        assert_eq!(
            encoded,
            json!({
                "mapValue": { "fields": {
                    "notes": { "arrayValue": { "values": [
                        { "stringValue": "C" },
                        { "integerValue": "1" }
                    ] } },
                    "empty": { "arrayValue": {} }
                } }
            })
        );
    }

    #[test]
    fn test_decode_special_kinds() {
        assert_eq!(
            decode(&json!({ "timestampValue": "2026-01-02T03:04:05Z" })).unwrap(),
            json!("2026-01-02T03:04:05Z")
        );
        assert_eq!(
            decode(&json!({ "geoPointValue": { "latitude": 1.5, "longitude": -2.0 } })).unwrap(),
            json!({ "latitude": 1.5, "longitude": -2.0 })
        );
        assert_eq!(decode(&json!({ "doubleValue": "NaN" })).unwrap(), Value::Null);
        assert_eq!(decode(&json!({ "mapValue": {} })).unwrap(), json!({}));
        assert_eq!(decode(&json!({ "arrayValue": {} })).unwrap(), json!([]));
    }

    #[test]
    fn test_decode_errors() {
        assert!(decode(&json!("raw")).is_err());
        assert!(decode(&json!({})).is_err());
        assert!(decode(&json!({ "integerValue": "twelve" })).is_err());
        assert!(decode(&json!({ "vectorValue": {} })).is_err());
    }

    #[test]
    fn test_decode_document() {
        let resource = json!({
            "name": "projects/p/databases/(default)/documents/users/u1",
            "fields": {
                "display_name": { "stringValue": "Ivy" },
                "level": { "integerValue": "3" }
            },
            "createTime": "2026-01-01T00:00:00.000000Z",
            "updateTime": "2026-01-02T00:00:00.000000Z"
        });

        let doc = decode_document(&resource).unwrap();
        assert_eq!(doc.id, "u1");
        assert_eq!(doc.get_str("display_name"), Some("Ivy"));
        assert_eq!(doc.fields["level"], json!(3));
        assert!(doc.create_time.is_some());
        assert!(doc.update_time > doc.create_time);
    }
}
