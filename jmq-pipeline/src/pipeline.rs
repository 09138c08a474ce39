//! Per-record processing: parse the input field, evaluate the query, and
//! project or default the result
//!
//! Each record moves through parse → evaluate → project → emit on its own;
//! data errors are captured into the record's error field and the record is
//! still emitted. Only a broken query (unknown function, invalid extension
//! call) aborts the run, and it does so between records.

use jmespath::{Expression, Variable};
use serde_json::Value;

use crate::project::Projector;
use crate::record::{self, Record};
use jmq_query::{classify_eval_error, EvalError, Result};

/// Error-field marker written when the input field does not hold JSON text.
pub const INVALID_JSON_MARKER: &str = "Invalid JSON.";

/// Options controlling one pipeline run. Immutable once the run starts.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Query text, compiled once for the whole run.
    pub query: String,
    /// Field holding the JSON text to query.
    pub input_field: String,
    /// Output field name, or a template containing a `*` wildcard.
    pub output_field: String,
    /// Field receiving per-record error messages.
    pub error_field: String,
    /// Value written to the output field when a record yields no result.
    pub default_value: Option<String>,
    /// Expand a non-empty array result into one output record per element.
    pub mvexpand: bool,
}

impl PipelineOptions {
    /// Options for a query with the stock field names.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            input_field: "_raw".to_string(),
            output_field: "jmespath".to_string(),
            error_field: "_jmespath_error".to_string(),
            default_value: None,
            mvexpand: false,
        }
    }
}

/// Records produced from one input record.
#[derive(Debug)]
pub struct Processed {
    /// Output records in emit order. Never empty: every input record comes
    /// back out, fan-out can only add copies.
    pub records: Vec<Record>,
    /// Whether a recoverable error was captured into the error field.
    pub failed: bool,
}

/// Counters for a whole run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Records read from the stream.
    pub records_in: u64,
    /// Records emitted downstream (fan-out can make this larger).
    pub records_out: u64,
    /// Records that carried a recoverable error.
    pub records_failed: u64,
}

/// Streaming evaluator applying one compiled query to every record.
pub struct Pipeline {
    expression: Expression<'static>,
    projector: Projector,
    opts: PipelineOptions,
}

impl Pipeline {
    /// Compile the query and freeze the run configuration.
    pub fn new(opts: PipelineOptions) -> Result<Self> {
        let expression = jmq_query::compile(&opts.query)?;
        let projector = Projector::new(&opts.output_field);
        Ok(Self {
            expression,
            projector,
            opts,
        })
    }

    /// Process one record, returning the records to emit in order.
    pub fn process(&self, mut record: Record) -> Result<Processed> {
        let parsed = match self.parse_input(&record) {
            Ok(value) => value,
            Err(message) => return Ok(self.fail(record, message)),
        };

        let result = match self.expression.search(parsed) {
            Ok(result) => result,
            Err(err) => match classify_eval_error(err) {
                EvalError::Fatal(fatal) => return Err(fatal),
                EvalError::Recoverable(message) => {
                    return Ok(self.fail(record, format!("JMESPath error: {}", message)))
                }
            },
        };

        if self.opts.mvexpand {
            if let Variable::Array(elements) = &*result {
                if !elements.is_empty() {
                    let records = elements
                        .iter()
                        .map(|element| {
                            let mut copy = record.clone();
                            self.projector.project(&mut copy, element);
                            copy
                        })
                        .collect();
                    return Ok(Processed {
                        records,
                        failed: false,
                    });
                }
            }
        }

        if result.is_null() {
            self.apply_default(&mut record);
        } else {
            self.projector.project(&mut record, &result);
        }
        Ok(Processed {
            records: vec![record],
            failed: false,
        })
    }

    fn parse_input(&self, record: &Record) -> std::result::Result<Variable, String> {
        let text = record::field_text(record, &self.opts.input_field)
            .ok_or_else(|| INVALID_JSON_MARKER.to_string())?;
        Variable::from_json(text).map_err(|_| INVALID_JSON_MARKER.to_string())
    }

    fn fail(&self, mut record: Record, message: String) -> Processed {
        record.insert(self.opts.error_field.clone(), Value::String(message));
        self.apply_default(&mut record);
        Processed {
            records: vec![record],
            failed: true,
        }
    }

    /// Defaults target the configured output field verbatim; they are never
    /// wildcard-expanded.
    fn apply_default(&self, record: &mut Record) {
        if let Some(default) = &self.opts.default_value {
            record.insert(
                self.opts.output_field.clone(),
                Value::String(default.clone()),
            );
        }
    }
}
