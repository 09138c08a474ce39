//! JMQ Pipeline - per-record query evaluation and output projection
//!
//! This crate provides the record-processing layer for JMQ:
//!
//! - A streaming pipeline driving parse → evaluate → project per record
//! - Output projection with wildcard field expansion
//! - Value flattening into multivalue-friendly text
//! - Field-name sanitization
//! - JSON reformatting of record fields
//!
//! Records stream through one at a time; data errors are captured onto the
//! record carrying them, and only configuration-grade failures abort a run.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod flatten;
pub mod format;
pub mod pipeline;
pub mod project;
pub mod record;
pub mod sanitize;

// Re-export commonly used types
pub use format::{FieldMapping, FormatOptions, Formatter, KeyOrder};
pub use jmq_query::{EvalError, JmqError, Result, UnrollMode};
pub use pipeline::{Pipeline, PipelineOptions, Processed, RunSummary, INVALID_JSON_MARKER};
pub use project::Projector;
pub use record::Record;
pub use sanitize::sanitize_field_name;

use std::io::{BufRead, Write};

/// Run the pipeline over an NDJSON record stream.
///
/// Reads one JSON object per line, processes it, and writes the resulting
/// record(s) as NDJSON in the same relative order. Blank lines are skipped.
/// Per-record errors are counted but never stop the stream; an undecodable
/// line or a fatal query error aborts with records already written left
/// in place.
pub fn process_stream<R: BufRead, W: Write>(
    pipeline: &Pipeline,
    input: R,
    mut output: W,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line)?;
        summary.records_in += 1;
        let outcome = pipeline.process(record)?;
        if outcome.failed {
            summary.records_failed += 1;
        }
        for record in outcome.records {
            serde_json::to_writer(&mut output, &record)?;
            output.write_all(b"\n")?;
            summary.records_out += 1;
        }
    }
    output.flush()?;
    Ok(summary)
}

/// Run the formatter over an NDJSON record stream, one record out per
/// record in.
pub fn format_stream<R: BufRead, W: Write>(
    formatter: &Formatter,
    input: R,
    mut output: W,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut record: Record = serde_json::from_str(&line)?;
        summary.records_in += 1;
        if formatter.process(&mut record) {
            summary.records_failed += 1;
        }
        serde_json::to_writer(&mut output, &record)?;
        output.write_all(b"\n")?;
        summary.records_out += 1;
    }
    output.flush()?;
    Ok(summary)
}
