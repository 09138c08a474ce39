//! Output field-name sanitization

/// Normalize an arbitrary string into a safe output field name.
///
/// Every character outside `A-Z a-z 0-9 _ . { } [ ]` becomes `_`, then
/// leading and trailing underscores are stripped so no hidden fields are
/// produced. Total and idempotent.
pub fn sanitize_field_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '{' | '}' | '[' | ']') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_matches('_').to_string()
}
