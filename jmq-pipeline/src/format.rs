//! Reformatting of JSON text held in record fields
//!
//! The formatter shares the pipeline's error posture: bad JSON in one record
//! is reported on that record and the stream keeps flowing. Unlike the query
//! pipeline it formats every element of a multivalue field, collecting one
//! error report per field.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Serializer, Value};

use crate::record::Record;
use jmq_query::{JmqError, Result};

/// Key ordering applied to reformatted objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOrder {
    /// Keep keys in their original order.
    #[default]
    Preserve,
    /// Sort keys lexicographically at every nesting level.
    Sort,
}

/// Source and destination fields for one reformatted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    /// Field holding the JSON text to reformat.
    pub source: String,
    /// Field receiving the formatted text.
    pub dest: String,
}

impl FieldMapping {
    /// Parse a `src` or `src=dest` mapping argument.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('=') {
            Some((source, dest)) => Self {
                source: source.to_string(),
                dest: dest.to_string(),
            },
            None => Self {
                source: raw.to_string(),
                dest: raw.to_string(),
            },
        }
    }
}

/// Options for a formatting run.
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Fields to reformat; empty means the stock raw field, in place.
    pub fields: Vec<FieldMapping>,
    /// Spaces per indentation level (0 emits compact JSON).
    pub indent: usize,
    /// Object key ordering.
    pub order: KeyOrder,
    /// Field receiving per-record error reports.
    pub error_field: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            indent: 2,
            order: KeyOrder::Preserve,
            error_field: "_jmespath_error".to_string(),
        }
    }
}

/// Reformats JSON text held in record fields, in place.
pub struct Formatter {
    fields: Vec<FieldMapping>,
    indent: String,
    order: KeyOrder,
    error_field: String,
}

impl Formatter {
    /// Validate options and build a formatter.
    pub fn new(opts: FormatOptions) -> Result<Self> {
        if opts.indent > 10 {
            return Err(JmqError::InvalidConfiguration(format!(
                "indent must be between 0 and 10, got {}",
                opts.indent
            )));
        }
        let fields = if opts.fields.is_empty() {
            vec![FieldMapping::parse("_raw")]
        } else {
            opts.fields
        };
        Ok(Self {
            fields,
            indent: " ".repeat(opts.indent),
            order: opts.order,
            error_field: opts.error_field,
        })
    }

    /// Reformat the configured fields of one record. Returns whether an
    /// error report was captured onto the record.
    ///
    /// Fields that are absent are skipped; per-element parse failures drop
    /// the element and land in a JSON error report on the error field.
    pub fn process(&self, record: &mut Record) -> bool {
        let mut errors: Map<String, Value> = Map::new();
        for mapping in &self.fields {
            let value = match record.get(&mapping.source) {
                Some(value) => value.clone(),
                None => continue,
            };
            let mut field_errors = Vec::new();
            let formatted = match &value {
                Value::String(text) => match self.format_text(text) {
                    Ok(text) => Some(Value::String(text)),
                    Err(message) => {
                        field_errors.push(message);
                        None
                    }
                },
                Value::Array(elements) => {
                    let mut formatted = Vec::new();
                    for element in elements {
                        let text = match element.as_str() {
                            Some(text) => text,
                            None => continue,
                        };
                        match self.format_text(text) {
                            Ok(text) => formatted.push(Value::String(text)),
                            Err(message) => field_errors.push(message),
                        }
                    }
                    match formatted.len() {
                        0 => None,
                        1 => formatted.pop(),
                        _ => Some(Value::Array(formatted)),
                    }
                }
                _ => None,
            };
            if let Some(formatted) = formatted {
                record.insert(mapping.dest.clone(), formatted);
            }
            if !field_errors.is_empty() {
                errors.insert(
                    mapping.source.clone(),
                    Value::Array(field_errors.into_iter().map(Value::String).collect()),
                );
            }
        }
        if errors.is_empty() {
            return false;
        }
        record.insert(
            self.error_field.clone(),
            Value::String(Value::Object(errors).to_string()),
        );
        true
    }

    fn format_text(&self, text: &str) -> std::result::Result<String, String> {
        let mut value: Value = serde_json::from_str(text).map_err(|err| err.to_string())?;
        if self.order == KeyOrder::Sort {
            sort_keys(&mut value);
        }
        if self.indent.is_empty() {
            return Ok(value.to_string());
        }
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(self.indent.as_bytes());
        let mut serializer = Serializer::with_formatter(&mut buf, formatter);
        value
            .serialize(&mut serializer)
            .map_err(|err| err.to_string())?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn sort_keys(value: &mut Value) {
    match value {
        Value::Object(entries) => {
            let mut sorted: Vec<(String, Value)> = std::mem::take(entries).into_iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(&b.0));
            for (_, child) in sorted.iter_mut() {
                sort_keys(child);
            }
            *entries = sorted.into_iter().collect();
        }
        Value::Array(elements) => {
            for element in elements {
                sort_keys(element);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn formatter(opts: FormatOptions) -> Formatter {
        Formatter::new(opts).expect("options should validate")
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(fields) => fields,
            _ => panic!("test records must be objects"),
        }
    }

    #[test]
    fn formats_the_raw_field_in_place_by_default() {
        let mut rec = record(json!({ "_raw": "{\"b\":1,\"a\":2}" }));
        formatter(FormatOptions::default()).process(&mut rec);
        assert_eq!(rec["_raw"], json!("{\n  \"b\": 1,\n  \"a\": 2\n}"));
    }

    #[test]
    fn sorts_keys_recursively_when_asked() {
        let mut rec = record(json!({ "_raw": "{\"b\":{\"z\":1,\"a\":2},\"a\":3}" }));
        formatter(FormatOptions {
            indent: 0,
            order: KeyOrder::Sort,
            ..FormatOptions::default()
        })
        .process(&mut rec);
        assert_eq!(rec["_raw"], json!("{\"a\":3,\"b\":{\"a\":2,\"z\":1}}"));
    }

    #[test]
    fn renames_into_the_destination_field() {
        let mut rec = record(json!({ "payload": "[1,2]" }));
        formatter(FormatOptions {
            fields: vec![FieldMapping::parse("payload=pretty")],
            indent: 0,
            ..FormatOptions::default()
        })
        .process(&mut rec);
        assert_eq!(rec["payload"], json!("[1,2]"));
        assert_eq!(rec["pretty"], json!("[1,2]"));
    }

    #[test]
    fn formats_each_multivalue_element_and_collects_errors() {
        let mut rec = record(json!({ "_raw": ["{\"a\":1}", "nope"] }));
        formatter(FormatOptions {
            indent: 0,
            ..FormatOptions::default()
        })
        .process(&mut rec);
        // One surviving element collapses to a scalar.
        assert_eq!(rec["_raw"], json!("{\"a\":1}"));
        let report = rec["_jmespath_error"].as_str().expect("error report");
        assert!(report.contains("_raw"));
    }

    #[test]
    fn bad_json_reports_and_leaves_the_field_alone() {
        let mut rec = record(json!({ "_raw": "not json" }));
        formatter(FormatOptions::default()).process(&mut rec);
        assert_eq!(rec["_raw"], json!("not json"));
        assert!(rec.contains_key("_jmespath_error"));
    }

    #[test]
    fn rejects_out_of_range_indents() {
        let result = Formatter::new(FormatOptions {
            indent: 11,
            ..FormatOptions::default()
        });
        assert!(matches!(result, Err(JmqError::InvalidConfiguration(_))));
    }
}
