//! Record model shared across the pipeline
//!
//! A record is an ordered mapping from field name to field text. A field
//! holds either a single string or an ordered list of strings (a multivalue
//! field); any other shape found on an incoming record is carried through
//! untouched. Records are mutated in place and never retained across
//! iterations.

use serde_json::{Map, Value};

/// One stream record.
pub type Record = Map<String, Value>;

/// Read a field as text.
///
/// A multivalue field contributes only its first value; reading never fails,
/// it just yields nothing for absent or non-text fields.
pub fn field_text<'a>(record: &'a Record, name: &str) -> Option<&'a str> {
    match record.get(name) {
        Some(Value::String(text)) => Some(text),
        Some(Value::Array(values)) => values.first().and_then(Value::as_str),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(fields) => fields,
            _ => panic!("test records must be objects"),
        }
    }

    #[test]
    fn reads_scalar_fields() {
        let record = record(json!({ "_raw": "payload" }));
        assert_eq!(field_text(&record, "_raw"), Some("payload"));
    }

    #[test]
    fn multivalue_fields_contribute_only_their_first_value() {
        let record = record(json!({ "_raw": ["first", "second"] }));
        assert_eq!(field_text(&record, "_raw"), Some("first"));
    }

    #[test]
    fn absent_and_non_text_fields_yield_nothing() {
        let record = record(json!({ "count": 3, "empty": [] }));
        assert_eq!(field_text(&record, "missing"), None);
        assert_eq!(field_text(&record, "count"), None);
        assert_eq!(field_text(&record, "empty"), None);
    }
}
