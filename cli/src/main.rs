//! Slowops CLI
//!
//! Derives event start times from database server logs. JSON log records are
//! reshaped with a leading `st` field; plain-text lines ending in `<n>ms` are
//! reformatted as `<start> => <completion> <n>ms <body> <n>ms`.
//!
//! # Usage
//!
//! ```bash
//! slowops --help
//! slowops mongod.log.1 mongod.log
//! zcat mongod.log.gz | slowops --skip-maintenance
//! ```

#![deny(unsafe_code)]

mod input;

use anyhow::Result;
use clap::Parser;
use input::InputChain;
use shared::config::SuppressionConfig;
use shared::transform::{LineTransformer, TransformError, TransformStats};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status for every failure except an unparseable timestamp.
const FAILURE_EXIT_CODE: u8 = 2;

/// Slowops - derive event start times from database server logs
#[derive(Parser)]
#[command(name = "slowops")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log files to read in order; `-` or no files reads standard input
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Suppress plain-text lines matching this regex (repeatable)
    #[arg(long = "skip", value_name = "REGEX")]
    skip: Vec<String>,

    /// Also suppress routine maintenance lines (split vector, lock cleaner, oplog truncation)
    #[arg(long, env = "SLOWOPS_SKIP_MAINTENANCE")]
    skip_maintenance: bool,

    /// Print run statistics as JSON to stderr when done
    #[arg(long)]
    stats: bool,
}

impl Cli {
    fn suppression_config(&self) -> SuppressionConfig {
        self.skip.iter().fold(
            SuppressionConfig::new().with_maintenance(self.skip_maintenance),
            |config, pattern| config.with_pattern(pattern.as_str()),
        )
    }
}

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only transformed lines.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(stats) => {
            tracing::info!(
                lines_read = stats.lines_read,
                emitted = stats.emitted(),
                suppressed = stats.suppressed,
                "finished"
            );
            if cli.stats {
                report_stats(&stats);
            }
            ExitCode::SUCCESS
        }
        Err(err) => report_failure(&err),
    }
}

/// Streams every input line through the transformer.
///
/// Output is flushed before returning, so anything the caller prints
/// afterwards follows all transformed lines.
fn run(cli: &Cli) -> Result<TransformStats> {
    let rules = cli.suppression_config().compile()?;
    tracing::debug!(rules = rules.len(), "compiled suppression rules");

    let mut transformer = LineTransformer::new(rules);
    let mut inputs = InputChain::new(&cli.files);
    let mut out = BufWriter::new(io::stdout().lock());
    let mut buf = Vec::new();

    let result = loop {
        buf.clear();
        match inputs.read_line(&mut buf) {
            Ok(0) => break Ok(()),
            Ok(_) => {}
            Err(err) => break Err(err),
        }
        if let Err(err) = transformer.process_line(&buf, &mut out) {
            break Err(anyhow::Error::from(err));
        }
    };

    let flushed = out.flush();
    result?;
    flushed?;
    Ok(*transformer.stats())
}

fn report_stats(stats: &TransformStats) {
    match serde_json::to_string(stats) {
        Ok(json) => eprintln!("{json}"),
        Err(err) => tracing::warn!(error = %err, "failed to serialize statistics"),
    }
}

fn report_failure(err: &anyhow::Error) -> ExitCode {
    if is_broken_pipe(err) {
        tracing::debug!("output closed early");
        return ExitCode::SUCCESS;
    }

    match err.downcast_ref::<TransformError>() {
        Some(transform) if transform.is_diagnostic() => {
            let mut stdout = io::stdout().lock();
            if let Err(write_err) = writeln!(stdout, "{transform}").and_then(|()| stdout.flush()) {
                tracing::warn!(error = %write_err, "failed to write diagnostic");
            }
            ExitCode::from(transform.exit_code())
        }
        Some(transform) => {
            eprintln!("error: {err:#}");
            ExitCode::from(transform.exit_code())
        }
        None => {
            eprintln!("error: {err:#}");
            ExitCode::from(FAILURE_EXIT_CODE)
        }
    }
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|io_err| io_err.kind() == io::ErrorKind::BrokenPipe)
}
