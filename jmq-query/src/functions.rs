//! Extension functions layered over the builtin JMESPath function table
//!
//! These cover the record-shaping chores that come up constantly when digging
//! through semi-structured payloads: parsing JSON text embedded in string
//! values, converting between objects and arrays of `[key, value]` pairs, and
//! collapsing an array of key/value-bearing objects into a single object.
//!
//! All functions are free functions with no state, so the table can be shared
//! across any number of evaluations without synchronization.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use jmespath::functions::{ArgumentType, CustomFunction, Signature};
use jmespath::{Context, ErrorReason, JmespathError, Rcvar, Runtime, Variable};

/// Collision policy applied by `unroll()` when two entries share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnrollMode {
    /// Accumulate every value seen for a key into an ordered list.
    All,
    /// Keep the first value seen for a key, discard later ones.
    First,
    /// Overwrite with the most recent value.
    #[default]
    Last,
}

impl UnrollMode {
    /// Parse a mode literal as it appears in a query.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "all" => Some(UnrollMode::All),
            "first" => Some(UnrollMode::First),
            "last" => Some(UnrollMode::Last),
            _ => None,
        }
    }
}

/// Register the extension function table on a runtime.
pub fn register_extension_functions(runtime: &mut Runtime) {
    runtime.register_function(
        "parse_json",
        Box::new(CustomFunction::new(
            Signature::new(
                vec![ArgumentType::Union(vec![
                    ArgumentType::String,
                    ArgumentType::Array,
                    ArgumentType::Null,
                ])],
                None,
            ),
            Box::new(parse_json),
        )),
    );
    // `pairs` is an alias kept for queries written against the older name.
    for name in ["items", "pairs"] {
        runtime.register_function(
            name,
            Box::new(CustomFunction::new(
                Signature::new(vec![ArgumentType::Object], None),
                Box::new(items),
            )),
        );
    }
    runtime.register_function(
        "to_hash",
        Box::new(CustomFunction::new(
            Signature::new(vec![ArgumentType::Array], None),
            Box::new(to_hash),
        )),
    );
    runtime.register_function(
        "unroll",
        Box::new(CustomFunction::new(
            Signature::new(
                vec![
                    ArgumentType::Array,
                    ArgumentType::String,
                    ArgumentType::String,
                ],
                Some(ArgumentType::String),
            ),
            Box::new(unroll),
        )),
    );
}

/// Parse JSON text held in a string, or in each string of an array.
///
/// Text that fails to parse is returned unchanged, never an error; null
/// passes through as null.
fn parse_json(args: &[Rcvar], _ctx: &mut Context) -> Result<Rcvar, JmespathError> {
    Ok(parse_json_value(&args[0]))
}

fn parse_json_value(value: &Rcvar) -> Rcvar {
    match &**value {
        Variable::String(text) => match Variable::from_json(text) {
            Ok(parsed) => Rcvar::new(parsed),
            Err(_) => value.clone(),
        },
        Variable::Array(elements) => {
            Rcvar::new(Variable::Array(elements.iter().map(parse_json_value).collect()))
        }
        _ => value.clone(),
    }
}

/// Convert an object into an array of `[key, value]` pairs, in key order.
fn items(args: &[Rcvar], _ctx: &mut Context) -> Result<Rcvar, JmespathError> {
    let mut pairs = Vec::new();
    if let Some(object) = args[0].as_object() {
        for (key, value) in object {
            pairs.push(Rcvar::new(Variable::Array(vec![
                Rcvar::new(Variable::String(key.clone())),
                value.clone(),
            ])));
        }
    }
    Ok(Rcvar::new(Variable::Array(pairs)))
}

/// Build an object from an array of `[key, value]` pairs.
///
/// Later duplicate keys overwrite earlier ones. Elements that are not exactly
/// two-element arrays are skipped. Inverse of `items` for well-formed input.
fn to_hash(args: &[Rcvar], _ctx: &mut Context) -> Result<Rcvar, JmespathError> {
    let mut object = BTreeMap::new();
    if let Some(pairs) = args[0].as_array() {
        for pair in pairs {
            match pair.as_array() {
                Some(entry) if entry.len() == 2 => {
                    object.insert(key_text(&entry[0]), entry[1].clone());
                }
                _ => continue,
            }
        }
    }
    Ok(Rcvar::new(Variable::Object(object)))
}

/// Build an object from an array of objects carrying key and value fields.
///
/// Entries missing either field are skipped. Non-string keys are coerced to
/// their string representation. The optional fourth argument picks the
/// collision policy (`all`, `first`, `last`; default `last`).
fn unroll(args: &[Rcvar], ctx: &mut Context) -> Result<Rcvar, JmespathError> {
    let mode = unroll_mode(args, ctx)?;
    let mut object: BTreeMap<String, Rcvar> = BTreeMap::new();

    if let (Some(entries), Some(key_field), Some(value_field)) =
        (args[0].as_array(), args[1].as_string(), args[2].as_string())
    {
        for entry in entries {
            let fields = match entry.as_object() {
                Some(fields) => fields,
                None => continue,
            };
            let (key, value) = match (fields.get(key_field), fields.get(value_field)) {
                (Some(key), Some(value)) => (key_text(key), value),
                _ => continue,
            };
            match mode {
                UnrollMode::Last => {
                    object.insert(key, value.clone());
                }
                UnrollMode::First => {
                    object.entry(key).or_insert_with(|| value.clone());
                }
                UnrollMode::All => match object.entry(key) {
                    Entry::Occupied(mut slot) => {
                        // The first collision converts the existing scalar
                        // into a one-element list before appending.
                        let existing = slot.get_mut();
                        let mut values = match &**existing {
                            Variable::Array(values) => values.clone(),
                            _ => vec![existing.clone()],
                        };
                        values.push(value.clone());
                        *existing = Rcvar::new(Variable::Array(values));
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(value.clone());
                    }
                },
            }
        }
    }
    Ok(Rcvar::new(Variable::Object(object)))
}

fn unroll_mode(args: &[Rcvar], ctx: &Context) -> Result<UnrollMode, JmespathError> {
    if args.len() > 4 {
        return Err(call_site_error(
            ctx,
            format!(
                "unroll() expects at most a single mode argument, received {}",
                args.len() - 3
            ),
        ));
    }
    match args.get(3) {
        None => Ok(UnrollMode::default()),
        Some(arg) => {
            let name = arg.as_string().map(String::as_str).unwrap_or_default();
            UnrollMode::from_name(name).ok_or_else(|| {
                call_site_error(
                    ctx,
                    format!(
                        "unroll() expects the mode to be 'all', 'first', or 'last', received '{}'",
                        name
                    ),
                )
            })
        }
    }
}

/// A `Parse` reason marks the call site itself as broken, which the caller
/// treats as fatal rather than as bad data in one record.
fn call_site_error(ctx: &Context, message: String) -> JmespathError {
    JmespathError::new(ctx.expression, ctx.offset, ErrorReason::Parse(message))
}

fn key_text(key: &Variable) -> String {
    match key {
        Variable::String(text) => text.clone(),
        other => other.to_string(),
    }
}
