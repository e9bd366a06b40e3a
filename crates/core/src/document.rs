//! Wire representation of schemaless documents.
//!
//! A document is a flat map of field names to primitive values. The set of
//! primitives mirrors what managed document stores expose, including a native
//! timestamp type.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field map of one stored document (the identifier is kept separately).
pub type Document = BTreeMap<String, FieldValue>;

/// A single primitive value stored in a document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Name of the primitive type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Integer(_) => "integer",
            FieldValue::Double(_) => "double",
            FieldValue::String(_) => "string",
            FieldValue::Timestamp(_) => "timestamp",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn json_encoding_is_tagged() {
        let v = FieldValue::Integer(5);
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            serde_json::json!({"type": "integer", "value": 5})
        );
        let null = serde_json::to_value(FieldValue::Null).unwrap();
        assert_eq!(null, serde_json::json!({"type": "null"}));
    }

    #[test]
    fn timestamp_survives_json() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let mut doc = Document::new();
        doc.insert("createdAt".to_string(), FieldValue::from(ts));
        doc.insert("price".to_string(), FieldValue::from(1.25));

        let text = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn integers_widen_to_numbers() {
        assert_eq!(FieldValue::Integer(3).as_number(), Some(3.0));
        assert_eq!(FieldValue::Double(2.5).as_number(), Some(2.5));
        assert_eq!(FieldValue::from("x").as_number(), None);
        assert_eq!(FieldValue::Double(2.5).as_integer(), None);
    }
}
