//! Conversion of query results into flat field text
//!
//! Record fields only hold text, so composite query results have to be
//! collapsed. Objects serialize whole; arrays contribute one string per
//! element (nested composites serialize, scalars stringify); scalars
//! stringify directly. Arrays are flattened one level only.
//!
//! Nulls inside a composite render as the JSON text `null`; a null query
//! result never reaches this module (the projector short-circuits it).

use jmespath::Variable;

/// Flatten a query result into a finite sequence of field-ready strings.
pub fn flatten(value: &Variable) -> Vec<String> {
    match value {
        Variable::Object(_) => vec![value.to_string()],
        Variable::Array(elements) => elements.iter().map(|e| element_text(e)).collect(),
        other => vec![scalar_text(other)],
    }
}

/// Text for a single array element: composites serialize, scalars stringify.
pub fn element_text(element: &Variable) -> String {
    match element {
        Variable::Array(_) | Variable::Object(_) => element.to_string(),
        other => scalar_text(other),
    }
}

/// String representation of a scalar. Strings stay unquoted; numbers,
/// booleans, and null use their JSON text.
pub fn scalar_text(value: &Variable) -> String {
    match value {
        Variable::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(text: &str) -> Variable {
        Variable::from_json(text).expect("test value should parse")
    }

    #[test]
    fn objects_serialize_to_a_single_json_text() {
        assert_eq!(flatten(&json(r#"{"a":1,"b":"x"}"#)), vec![r#"{"a":1,"b":"x"}"#]);
        assert_eq!(flatten(&json("{}")), vec!["{}"]);
    }

    #[test]
    fn empty_arrays_flatten_to_nothing() {
        assert!(flatten(&json("[]")).is_empty());
    }

    #[test]
    fn single_element_arrays_flatten_to_exactly_one_string() {
        assert_eq!(flatten(&json("[42]")), vec!["42"]);
    }

    #[test]
    fn array_elements_flatten_one_level_only() {
        assert_eq!(
            flatten(&json(r#"[1,"two",[3,4],{"five":5}]"#)),
            vec!["1", "two", "[3,4]", r#"{"five":5}"#]
        );
    }

    #[test]
    fn scalars_stringify_without_quotes() {
        assert_eq!(flatten(&json(r#""text""#)), vec!["text"]);
        assert_eq!(flatten(&json("2.5")), vec!["2.5"]);
        assert_eq!(flatten(&json("true")), vec!["true"]);
    }

    #[test]
    fn nulls_inside_arrays_render_as_json_null() {
        assert_eq!(flatten(&json("[1,null,2]")), vec!["1", "null", "2"]);
    }
}
