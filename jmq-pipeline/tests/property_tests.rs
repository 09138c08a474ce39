//! Property-based tests for the formatting primitives

use jmespath::Variable;
use jmq_pipeline::flatten::flatten;
use jmq_pipeline::sanitize_field_name;
use proptest::prelude::*;

fn is_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '{' | '}' | '[' | ']')
}

proptest! {
    #[test]
    fn sanitizing_is_idempotent(name in ".*") {
        let once = sanitize_field_name(&name);
        prop_assert_eq!(sanitize_field_name(&once), once);
    }

    #[test]
    fn sanitized_names_stay_in_the_safe_alphabet(name in ".*") {
        let cleaned = sanitize_field_name(&name);
        prop_assert!(cleaned.chars().all(is_safe));
        prop_assert!(!cleaned.starts_with('_'));
        prop_assert!(!cleaned.ends_with('_'));
    }

    #[test]
    fn flattening_a_scalar_array_yields_one_string_per_element(
        elements in prop::collection::vec(-1000i64..1000, 0..16)
    ) {
        let raw = serde_json::to_string(&elements).expect("array should serialize");
        let value = Variable::from_json(&raw).expect("array should parse");
        prop_assert_eq!(flatten(&value).len(), elements.len());
    }
}
