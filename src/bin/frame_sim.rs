//! Frame Simulator
//!
//! Loads a protocol schema, builds every message's frames and runs the
//! loop-back simulation.
//!
//! Usage: cargo run --bin frame-sim -- --schema schemas/modbus_rtu.json [--rounds N]
//!
//! Exit codes: 0 when every transaction succeeded, 1 on a fatal error,
//! 2 when some transactions failed validation.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use modbus_schema::constants::DEFAULT_ROUNDS;
use modbus_schema::{CallbackLogger, LogLevel, Protocol, RunOptions};

#[derive(Parser)]
#[command(name = "frame-sim")]
#[command(about = "Build Modbus frames from a JSON schema and validate them in a loop-back run")]
#[command(version)]
struct Cli {
    /// Protocol schema (JSON)
    #[arg(short, long)]
    schema: PathBuf,

    /// Transactions per message
    #[arg(short, long, default_value_t = DEFAULT_ROUNDS)]
    rounds: usize,

    /// Fixed seed for filler payload bytes
    #[arg(long)]
    seed: Option<u64>,

    /// Fail on bytes that cannot be transcoded to ASCII instead of dropping them
    #[arg(long)]
    strict_ascii: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = LogLevel::from_str(&cli.log_level).unwrap_or(LogLevel::Info);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut options = RunOptions::new()
        .with_rounds(cli.rounds)
        .with_strict_ascii(cli.strict_ascii);
    if let Some(seed) = cli.seed {
        options = options.with_seed(seed);
    }

    let logger = CallbackLogger::new();
    let mut protocol = match Protocol::load(&cli.schema, options, logger) {
        Ok(protocol) => protocol,
        Err(e) => {
            eprintln!("{}: {}", cli.schema.display(), e);
            return ExitCode::from(1);
        }
    };
    protocol.log();

    match protocol.run() {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(report) => {
            eprintln!(
                "{} of {} transactions failed",
                report.stats.failures(),
                report.stats.transactions
            );
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("simulation aborted: {}", e);
            ExitCode::from(1)
        }
    }
}
