//! JMQ CLI - stream JMESPath queries over NDJSON record streams
//!
//! This binary provides command-line interfaces for:
//! - eval: evaluate a JMESPath query against a JSON field of each record
//! - fmt: reformat JSON text held in record fields
//!
//! Records are read as NDJSON (one JSON object per line) from stdin or a
//! file, and written back out as NDJSON in the same relative order. Data
//! errors are captured onto the records carrying them; only a broken query
//! or unusable configuration stops the run.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use jmq_pipeline::{
    FieldMapping, FormatOptions, Formatter, KeyOrder, Pipeline, PipelineOptions, Record,
    RunSummary,
};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "jmq")]
#[command(about = "JMESPath processor for NDJSON record streams")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a JMESPath query against a JSON field of each record
    ///
    /// Examples:
    ///   jmq eval 'user.name' < records.ndjson
    ///   jmq eval --output 'out_*' 'parse_json(_raw)' --file records.ndjson
    ///   jmq eval --mvexpand 'events[].id' --default none
    Eval {
        /// JMESPath query text
        query: String,
        /// Input field holding JSON text
        #[arg(long, default_value = "_raw")]
        input: String,
        /// Output field name, or a template containing a `*` wildcard
        #[arg(long, default_value = "jmespath")]
        output: String,
        /// Field receiving per-record error messages
        #[arg(long, default_value = "_jmespath_error")]
        error_field: String,
        /// Value written to the output field when the query yields no result
        #[arg(long)]
        default: Option<String>,
        /// Expand a non-empty array result into one record per element
        #[arg(long)]
        mvexpand: bool,
        /// Read records from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Write records to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Display a progress spinner during streaming
        #[arg(long)]
        progress: bool,
    },
    /// Reformat JSON text held in record fields
    ///
    /// Examples:
    ///   jmq fmt < records.ndjson
    ///   jmq fmt --field payload=pretty --indent 4 --order sort
    Fmt {
        /// Field to reformat, as `src` or `src=dest` (repeatable; default _raw)
        #[arg(long = "field", value_name = "SRC[=DEST]")]
        fields: Vec<String>,
        /// Spaces per indentation level (0 emits compact JSON)
        #[arg(long, default_value_t = 2)]
        indent: usize,
        /// Object key ordering
        #[arg(long, value_enum, default_value_t = OrderArg::Preserve)]
        order: OrderArg,
        /// Field receiving per-record error reports
        #[arg(long, default_value = "_jmespath_error")]
        error_field: String,
        /// Read records from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Write records to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Display a progress spinner during streaming
        #[arg(long)]
        progress: bool,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OrderArg {
    Preserve,
    Sort,
}

impl From<OrderArg> for KeyOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Preserve => KeyOrder::Preserve,
            OrderArg::Sort => KeyOrder::Sort,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval {
            query,
            input,
            output,
            error_field,
            default,
            mvexpand,
            file,
            out,
            progress,
        } => {
            let opts = PipelineOptions {
                query,
                input_field: input,
                output_field: output,
                error_field,
                default_value: default,
                mvexpand,
            };
            handle_eval(opts, file, out, progress)?;
        }
        Commands::Fmt {
            fields,
            indent,
            order,
            error_field,
            file,
            out,
            progress,
        } => {
            let opts = FormatOptions {
                fields: fields.iter().map(|raw| FieldMapping::parse(raw)).collect(),
                indent,
                order: order.into(),
                error_field,
            };
            handle_fmt(opts, file, out, progress)?;
        }
    }

    Ok(())
}

fn handle_eval(
    opts: PipelineOptions,
    file: Option<PathBuf>,
    out: Option<PathBuf>,
    progress: bool,
) -> Result<(), Box<dyn Error>> {
    let pipeline = Pipeline::new(opts)?;
    let reader = open_input(file)?;
    let mut writer = open_output(out)?;
    let progress_bar = progress.then(|| create_spinner("Evaluating records"));
    let start = Instant::now();
    let mut summary = RunSummary::default();

    for line in reader.lines() {
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
            serde_json::to_writer(&mut writer, &record)?;
            writer.write_all(b"\n")?;
            summary.records_out += 1;
        }
        if let Some(pb) = &progress_bar {
            pb.set_position(summary.records_in);
        }
    }
    writer.flush()?;

    finish_run(progress_bar, summary, start.elapsed())?;
    Ok(())
}

fn handle_fmt(
    opts: FormatOptions,
    file: Option<PathBuf>,
    out: Option<PathBuf>,
    progress: bool,
) -> Result<(), Box<dyn Error>> {
    let formatter = Formatter::new(opts)?;
    let reader = open_input(file)?;
    let mut writer = open_output(out)?;
    let progress_bar = progress.then(|| create_spinner("Formatting records"));
    let start = Instant::now();
    let mut summary = RunSummary::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut record: Record = serde_json::from_str(&line)?;
        summary.records_in += 1;
        if formatter.process(&mut record) {
            summary.records_failed += 1;
        }
        serde_json::to_writer(&mut writer, &record)?;
        writer.write_all(b"\n")?;
        summary.records_out += 1;
        if let Some(pb) = &progress_bar {
            pb.set_position(summary.records_in);
        }
    }
    writer.flush()?;

    finish_run(progress_bar, summary, start.elapsed())?;
    Ok(())
}

fn open_input(path: Option<PathBuf>) -> io::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    })
}

fn open_output(path: Option<PathBuf>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn finish_run(
    progress_bar: Option<ProgressBar>,
    summary: RunSummary,
    elapsed: Duration,
) -> io::Result<()> {
    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!(
            "Processed {} records in {:.2?}",
            summary.records_in, elapsed
        ));
    }
    let mut stderr = io::stderr().lock();
    writeln!(
        &mut stderr,
        "Processed {} records into {} in {:.2?} ({} with captured errors)",
        summary.records_in, summary.records_out, elapsed, summary.records_failed
    )
}
