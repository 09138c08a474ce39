//! JMQ Test Utilities
//!
//! Shared helpers for building stream records in tests.

use serde_json::{Map, Value};

/// Builder for stream records with common field patterns.
pub struct RecordBuilder {
    fields: Map<String, Value>,
}

impl RecordBuilder {
    /// Create an empty record builder.
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Set the stock raw input field to the given JSON text.
    pub fn raw(self, text: &str) -> Self {
        self.field("_raw", text)
    }

    /// Add a field with a string value.
    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.fields
            .insert(name.to_string(), Value::String(value.to_string()));
        self
    }

    /// Add a multivalue field holding an ordered list of strings.
    pub fn multivalue(mut self, name: &str, values: &[&str]) -> Self {
        self.fields.insert(
            name.to_string(),
            Value::Array(
                values
                    .iter()
                    .map(|value| Value::String((*value).to_string()))
                    .collect(),
            ),
        );
        self
    }

    /// Finish building and return the record.
    pub fn build(self) -> Map<String, Value> {
        self.fields
    }
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_ordered_records() {
        let record = RecordBuilder::new()
            .raw("{}")
            .field("host", "web-1")
            .multivalue("tags", &["a", "b"])
            .build();
        let names: Vec<_> = record.keys().collect();
        assert_eq!(names, vec!["_raw", "host", "tags"]);
    }
}
