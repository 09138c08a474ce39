//! Projection of query results onto records

use jmespath::Variable;
use serde_json::Value;

use crate::flatten::{element_text, flatten, scalar_text};
use crate::record::Record;
use crate::sanitize::sanitize_field_name;

/// Wildcard substitution used when a composite template meets a scalar result.
const SCALAR_WILDCARD_TOKEN: &str = "value";

/// Writes query results into record fields according to the output template.
///
/// A plain template names one field; a template containing `*` expands into
/// one field per object key (sanitized) or array index.
#[derive(Debug, Clone)]
pub struct Projector {
    template: String,
    wildcard: bool,
}

impl Projector {
    /// Build a projector for an output field name or wildcard template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
            wildcard: template.contains('*'),
        }
    }

    /// Project a result onto the record. A null result writes nothing at all.
    pub fn project(&self, record: &mut Record, value: &Variable) {
        if value.is_null() {
            return;
        }
        if self.wildcard {
            self.project_wildcard(record, value);
        } else {
            self.project_plain(record, value);
        }
    }

    /// Single-field path: the flattened result collapses to nothing (field
    /// unset), one scalar, or an ordered multivalue field.
    fn project_plain(&self, record: &mut Record, value: &Variable) {
        let mut values = flatten(value);
        if values.is_empty() {
            record.remove(&self.template);
        } else if values.len() == 1 {
            record.insert(self.template.clone(), Value::String(values.pop().unwrap_or_default()));
        } else {
            record.insert(
                self.template.clone(),
                Value::Array(values.into_iter().map(Value::String).collect()),
            );
        }
    }

    fn project_wildcard(&self, record: &mut Record, value: &Variable) {
        match value {
            Variable::Object(entries) => {
                for (key, entry) in entries {
                    let field = self.template.replacen('*', &sanitize_field_name(key), 1);
                    self.write_expanded(record, &field, entry);
                }
            }
            Variable::Array(elements) => {
                for (idx, element) in elements.iter().enumerate() {
                    let field = self.template.replacen('*', &idx.to_string(), 1);
                    self.write_expanded(record, &field, element);
                }
            }
            scalar => {
                // Degenerate case: nothing to substitute, so a fixed token
                // stands in for the wildcard and the scalar lands there.
                let field = self.template.replacen('*', SCALAR_WILDCARD_TOKEN, 1);
                record.insert(field, Value::String(scalar_text(scalar)));
            }
        }
    }

    /// Expanded fields never become multivalue: a multi-element array value
    /// serializes to JSON text instead, keeping one value per derived field.
    fn write_expanded(&self, record: &mut Record, field: &str, value: &Variable) {
        match value {
            Variable::Array(elements) => match elements.len() {
                0 => {
                    record.remove(field);
                }
                1 => {
                    record.insert(field.to_string(), Value::String(element_text(&elements[0])));
                }
                _ => {
                    record.insert(field.to_string(), Value::String(value.to_string()));
                }
            },
            Variable::Object(_) => {
                record.insert(field.to_string(), Value::String(value.to_string()));
            }
            scalar => {
                record.insert(field.to_string(), Value::String(scalar_text(scalar)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project(template: &str, result: &str) -> Record {
        let mut record = Record::new();
        let value = Variable::from_json(result).expect("test value should parse");
        Projector::new(template).project(&mut record, &value);
        record
    }

    #[test]
    fn plain_scalar_results_write_one_field() {
        let record = project("out", r#""hit""#);
        assert_eq!(record.get("out"), Some(&json!("hit")));
    }

    #[test]
    fn plain_multi_element_results_write_a_multivalue_field() {
        let record = project("out", "[1,2,3]");
        assert_eq!(record.get("out"), Some(&json!(["1", "2", "3"])));
    }

    #[test]
    fn plain_empty_array_unsets_the_field() {
        let mut record = Record::new();
        record.insert("out".to_string(), json!("stale"));
        let value = Variable::from_json("[]").expect("test value should parse");
        Projector::new("out").project(&mut record, &value);
        assert!(!record.contains_key("out"));
    }

    #[test]
    fn null_results_write_nothing() {
        let record = project("out", "null");
        assert!(record.is_empty());
    }

    #[test]
    fn wildcard_expands_object_keys() {
        let record = project("out_*", r#"{"a":1,"b":2}"#);
        assert_eq!(record.get("out_a"), Some(&json!("1")));
        assert_eq!(record.get("out_b"), Some(&json!("2")));
    }

    #[test]
    fn wildcard_sanitizes_object_keys() {
        let record = project("out_*", r#"{"bad key!":1}"#);
        assert_eq!(record.get("out_bad_key"), Some(&json!("1")));
    }

    #[test]
    fn wildcard_expands_array_indices() {
        let record = project("out_*", r#"["a","b"]"#);
        assert_eq!(record.get("out_0"), Some(&json!("a")));
        assert_eq!(record.get("out_1"), Some(&json!("b")));
    }

    #[test]
    fn wildcard_values_never_become_multivalue() {
        let record = project("out_*", r#"{"a":[1,2],"b":[1],"c":[],"d":{"x":1}}"#);
        assert_eq!(record.get("out_a"), Some(&json!("[1,2]")));
        assert_eq!(record.get("out_b"), Some(&json!("1")));
        assert!(!record.contains_key("out_c"));
        assert_eq!(record.get("out_d"), Some(&json!(r#"{"x":1}"#)));
    }

    #[test]
    fn wildcard_scalar_falls_back_to_a_fixed_token() {
        let record = project("out_*", "42");
        assert_eq!(record.get("out_value"), Some(&json!("42")));
    }
}
