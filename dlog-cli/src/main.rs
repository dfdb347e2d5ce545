//! dlog CLI - Command-line tool for dictionary-interned log streams
//!
//! This binary provides command-line interfaces for:
//! - encode: NDJSON → dlog stream
//! - decode: dlog stream → NDJSON
//! - ls: list records, backlinks and dictionary epochs

use clap::{Args, Parser, Subcommand, ValueEnum};
use dlog_format::constants::{INTERN_CACHE_SIZE, INTERN_THRESH, MAX_NESTING_DEPTH};
use dlog_io::{
    decode_ndjson, encode_ndjson, inspect, DecodeOpts, DecodeSummary, EncodeOpts, EncodeSummary,
    InspectSummary, Limits, RecordInfo,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const VALUE_PREVIEW_CHARS: usize = 60;

#[derive(Parser)]
#[command(name = "dlog")]
#[command(about = "Dictionary-interned binary log stream tool")]
#[command(version)]
struct Cli {
    /// Show diagnostic logs on stderr (honours RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode NDJSON into a dlog stream
    Encode {
        /// Input file (NDJSON), or `-` for stdin
        input: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Sightings a value string needs before it is interned (at least 1)
        #[arg(
            long,
            default_value_t = INTERN_THRESH,
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
        )]
        intern_threshold: usize,
        /// Number of distinct strings the usage tracker remembers
        #[arg(long, default_value_t = INTERN_CACHE_SIZE)]
        intern_cache_size: usize,
        /// Start a new dictionary epoch once this many strings are interned
        #[arg(long)]
        clear_threshold: Option<usize>,
        /// Forget usage counts whenever a new epoch starts
        #[arg(long)]
        reset_usage_on_clear: bool,
        /// Deepest array/object nesting accepted in an input line
        #[arg(long, default_value_t = MAX_NESTING_DEPTH)]
        max_nesting_depth: usize,
        /// Print the summary as JSON
        #[arg(long)]
        json_summary: bool,
        /// Show progress spinner while encoding
        #[arg(long)]
        progress: bool,
    },
    /// Decode a dlog stream into NDJSON
    Decode {
        /// Input file (dlog stream), or `-` for stdin
        input: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        limits: LimitArgs,
        /// Print the summary as JSON
        #[arg(long)]
        json_summary: bool,
        /// Show progress spinner while decoding
        #[arg(long)]
        progress: bool,
    },
    /// List records, offsets and backlinks
    ///
    /// Examples:
    ///   dlog ls events.dlog
    ///   dlog ls events.dlog --skip-values
    ///   dlog ls events.dlog --format json --summary-only
    Ls {
        /// Input file (dlog stream), or `-` for stdin
        input: PathBuf,
        /// Output format (table, json)
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
        /// Skip value payloads by their declared length
        #[arg(long)]
        skip_values: bool,
        /// Only print the totals
        #[arg(long)]
        summary_only: bool,
        #[command(flatten)]
        limits: LimitArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct LimitArgs {
    /// Longest accepted string literal, in bytes
    #[arg(long)]
    max_string_len: Option<usize>,
    /// Longest accepted value payload, in bytes
    #[arg(long)]
    max_payload_len: Option<usize>,
    /// Deepest accepted array/object nesting
    #[arg(long)]
    max_nesting_depth: Option<usize>,
    /// Largest accepted dictionary
    #[arg(long)]
    max_dictionary_entries: Option<usize>,
}

impl LimitArgs {
    fn decode_opts(&self) -> DecodeOpts {
        let defaults = Limits::default();
        DecodeOpts {
            limits: Limits {
                max_string_len: self.max_string_len.unwrap_or(defaults.max_string_len),
                max_payload_len: self.max_payload_len.unwrap_or(defaults.max_payload_len),
                max_nesting_depth: self.max_nesting_depth.unwrap_or(defaults.max_nesting_depth),
                max_dictionary_entries: self
                    .max_dictionary_entries
                    .unwrap_or(defaults.max_dictionary_entries),
            },
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LsFormat {
    Table,
    Json,
}

fn init_tracing(verbose: bool) {
    // Silent by default so progress spinners own stderr; --verbose shows
    // info, or whatever RUST_LOG asks for.
    let filter = if verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("off")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Encode {
            input,
            output,
            intern_threshold,
            intern_cache_size,
            clear_threshold,
            reset_usage_on_clear,
            max_nesting_depth,
            json_summary,
            progress,
        } => {
            let opts = EncodeOpts {
                intern_threshold,
                intern_cache_size,
                clear_threshold,
                reset_usage_on_clear,
                max_nesting_depth,
            };
            handle_encode(&input, output.as_deref(), opts, json_summary, progress)?;
        }
        Commands::Decode {
            input,
            output,
            limits,
            json_summary,
            progress,
        } => {
            handle_decode(
                &input,
                output.as_deref(),
                limits.decode_opts(),
                json_summary,
                progress,
            )?;
        }
        Commands::Ls {
            input,
            format,
            skip_values,
            summary_only,
            limits,
        } => {
            let mut stdout = std::io::stdout().lock();
            handle_ls(
                &input,
                &mut stdout,
                format,
                skip_values,
                summary_only,
                limits.decode_opts(),
            )?;
        }
    }

    Ok(())
}

fn handle_encode(
    input: &Path,
    output: Option<&Path>,
    opts: EncodeOpts,
    json_summary: bool,
    show_progress: bool,
) -> Result<EncodeSummary, Box<dyn Error>> {
    let start = Instant::now();
    let reader = open_input(input)?;
    let writer = open_output(output)?;

    let mut progress_bar = show_progress.then(|| create_spinner("Encoding lines"));
    tracing::info!(input = %input.display(), ?opts, "encoding");
    let summary = encode_ndjson(reader, writer, opts)?;
    let elapsed = start.elapsed();
    if let Some(pb) = progress_bar.take() {
        pb.finish_with_message(format!(
            "Encoded {} lines in {:.2?}",
            summary.value_records, elapsed
        ));
    }

    if json_summary {
        report_json(&summary)?;
    } else {
        let ratio = if summary.bytes_in > 0 {
            summary.bytes_out as f64 / summary.bytes_in as f64
        } else {
            0.0
        };
        let mut stderr = std::io::stderr().lock();
        writeln!(
            &mut stderr,
            "Encoded {} (lines: {}, blank: {}, dictionary adds: {}, strings interned: {}, epochs: {}, bytes: {} → {} ({:.1}%), elapsed: {:.2?})",
            describe(output),
            summary.value_records,
            summary.blank_lines,
            summary.add_records,
            summary.strings_interned,
            summary.clear_records,
            summary.bytes_in,
            summary.bytes_out,
            ratio * 100.0,
            elapsed
        )?;
    }
    Ok(summary)
}

fn handle_decode(
    input: &Path,
    output: Option<&Path>,
    opts: DecodeOpts,
    json_summary: bool,
    show_progress: bool,
) -> Result<DecodeSummary, Box<dyn Error>> {
    let start = Instant::now();
    let reader = open_input(input)?;
    let writer = open_output(output)?;

    let mut progress_bar = show_progress.then(|| create_spinner("Decoding records"));
    tracing::info!(input = %input.display(), limits = ?opts.limits, "decoding");
    let result = decode_ndjson(reader, writer, opts);
    if let Some(pb) = progress_bar.take() {
        match &result {
            Ok(summary) => pb.finish_with_message(format!(
                "Decoded {} lines in {:.2?}",
                summary.values,
                start.elapsed()
            )),
            Err(_) => pb.abandon_with_message("Decode failed"),
        }
    }
    let summary = result?;

    if json_summary {
        report_json(&summary)?;
    } else {
        let mut stderr = std::io::stderr().lock();
        writeln!(
            &mut stderr,
            "Decoded to {} (lines: {}, records: {}, epochs: {}, final dictionary: {}, bytes read: {}, elapsed: {:.2?})",
            describe(output),
            summary.values,
            summary.records,
            summary.clear_records,
            summary.dictionary_entries,
            summary.bytes_read,
            start.elapsed()
        )?;
    }
    Ok(summary)
}

#[derive(Serialize)]
struct LsJson<'a> {
    summary: &'a InspectSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<&'a [RecordInfo]>,
}

fn handle_ls(
    input: &Path,
    out: &mut dyn Write,
    format: LsFormat,
    skip_values: bool,
    summary_only: bool,
    opts: DecodeOpts,
) -> Result<InspectSummary, Box<dyn Error>> {
    let reader = open_input(input)?;

    let summary = match format {
        LsFormat::Table => {
            if !summary_only {
                writeln!(out, "Offset\tKind\tBacklink\tDictionary\tDetail")?;
            }
            let summary = inspect(reader, opts, skip_values, |info| {
                if !summary_only {
                    writeln!(
                        out,
                        "{}\t{}\t{}\t{}\t{}",
                        info.offset,
                        info.kind,
                        info.backlink
                            .map_or_else(|| "-".to_string(), |b| b.to_string()),
                        info.dictionary_entries,
                        record_detail(info)
                    )?;
                }
                Ok(())
            })?;
            if !summary_only {
                writeln!(out)?;
            }
            print_ls_summary(out, &summary)?;
            summary
        }
        LsFormat::Json => {
            let mut records = Vec::new();
            let summary = inspect(reader, opts, skip_values, |info| {
                if !summary_only {
                    records.push(info.clone());
                }
                Ok(())
            })?;
            let doc = LsJson {
                summary: &summary,
                records: (!summary_only).then_some(records.as_slice()),
            };
            serde_json::to_writer_pretty(&mut *out, &doc)?;
            writeln!(out)?;
            summary
        }
    };

    Ok(summary)
}

fn record_detail(info: &RecordInfo) -> String {
    if let Some(version) = info.version {
        return format!("version {}", version);
    }
    if let Some(entries) = info.entries {
        return format!("+{} strings", entries);
    }
    match (info.payload_len, &info.value) {
        (Some(len), Some(value)) => format!("{} bytes {}", len, preview(&value.to_string())),
        (Some(len), None) => format!("{} bytes", len),
        _ => String::new(),
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(VALUE_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

fn print_ls_summary(out: &mut dyn Write, summary: &InspectSummary) -> Result<(), Box<dyn Error>> {
    writeln!(
        out,
        "version: {}",
        summary
            .version
            .map_or_else(|| "-".to_string(), |v| v.to_string())
    )?;
    writeln!(
        out,
        "records: {} (values: {}, adds: {}, clears: {})",
        summary.records, summary.value_records, summary.add_records, summary.clear_records
    )?;
    writeln!(
        out,
        "dictionary: {} final, {} max",
        summary.final_dictionary_entries, summary.max_dictionary_entries
    )?;
    writeln!(out, "bytes: {}", summary.bytes)?;
    Ok(())
}

fn open_input(path: &Path) -> Result<Box<dyn Read>, Box<dyn Error>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = File::open(path).map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    Ok(Box::new(file))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, Box<dyn Error>> {
    match path {
        Some(path) => {
            let file =
                File::create(path).map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(BufWriter::new(std::io::stdout()))),
    }
}

fn describe(output: Option<&Path>) -> String {
    output.map_or_else(|| "stdout".to_string(), |p| p.display().to_string())
}

fn report_json<T: Serialize>(summary: &T) -> Result<(), Box<dyn Error>> {
    let mut stderr = std::io::stderr().lock();
    serde_json::to_writer(&mut stderr, summary)?;
    writeln!(&mut stderr)?;
    Ok(())
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
