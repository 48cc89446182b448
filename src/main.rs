//! Command-line front end for `leasing_schedule`.
//!
//! Reads a schedule request as JSON from a file or stdin and prints the
//! resulting schedule as JSON on stdout.
//!
//! ```bash
//! leasing-schedule --input request.json --view client
//! cat request.json | LEASING_LOG=debug leasing-schedule
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use leasing_schedule::view::{ScheduleResponse, project};
use leasing_schedule::{ScheduleRequest, compute_schedule};
use tracing_subscriber::EnvFilter;

/// Leasing amortization schedules (annuity and differentiated)
#[derive(Debug, Parser)]
#[command(name = "leasing-schedule", version, about)]
struct Cli {
    /// JSON request file; stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Which projection of the schedule to print
    #[arg(long, value_enum, default_value = "client")]
    view: View,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,

    /// Log filter directive (trace, debug, info, warn, error)
    #[arg(long, env = "LEASING_LOG", default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum View {
    /// Every field of every line, VAT breakdowns included
    Full,
    /// `{month, date, payment, principal, interest, balance}` per line
    Client,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let (response, code) = match run(&cli) {
        Ok(data) => (ScheduleResponse::ok(data), ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "schedule computation failed");
            (ScheduleResponse::failure(format!("{e:#}")), ExitCode::FAILURE)
        }
    };

    let rendered = if cli.compact {
        serde_json::to_string(&response)
    } else {
        serde_json::to_string_pretty(&response)
    };
    match rendered {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("JSON serialization error: {e}");
            return ExitCode::FAILURE;
        }
    }
    code
}

fn run(cli: &Cli) -> anyhow::Result<serde_json::Value> {
    let raw = read_input(cli.input.as_ref())?;
    let request: ScheduleRequest =
        serde_json::from_str(&raw).context("failed to parse schedule request")?;

    let lines = compute_schedule(&request)?;
    let value = match cli.view {
        View::Full => serde_json::to_value(&lines)?,
        View::Client => serde_json::to_value(project(&lines))?,
    };
    Ok(value)
}

fn read_input(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read request from stdin")?;
            Ok(buffer)
        }
    }
}

fn init_tracing(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
