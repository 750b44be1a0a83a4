//! whbar-sim: runs WHBAR ledger scripts against the in-process runtime.
//!
//! Reads a JSON script of funded accounts and calls, executes every call with
//! full call-frame semantics and prints a JSON report of per-call outcomes,
//! emitted events and the final ledger state.

#![allow(missing_docs, rustdoc::missing_crate_level_docs)]

mod script;

use clap::Parser;
use eyre::WrapErr;
use std::{io::Write, path::PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use whbar_precompile::WhbarConfig;

/// Runs a WHBAR ledger script and prints the resulting report.
#[derive(Parser, Debug)]
#[command(name = "whbar-sim", about = "Run WHBAR ledger scripts in-process")]
struct Args {
    /// Path of the JSON script to run
    script: PathBuf,

    /// Write the report here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Pretty-print the report
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Exit with an error if any call failed
    #[arg(long, env = "WHBAR_SIM_STRICT", default_value_t = false)]
    strict: bool,
}

/// Initialize tracing, writing to stderr so stdout carries only the report.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> eyre::Result<()> {
    init_tracing();
    let args = Args::parse();

    let script = script::Script::load(&args.script)?;
    let config = match &script.config {
        Some(config) => {
            config.validate()?;
            config.clone()
        }
        None => WhbarConfig::from_env().wrap_err("invalid WHBAR configuration in environment")?,
    };
    info!(
        contract = ?config.precompile_address,
        symbol = %config.metadata.symbol,
        calls = script.calls.len(),
        "running script"
    );

    let report = script::run(&script, &config);
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    match &args.output {
        Some(path) => std::fs::write(path, json)
            .wrap_err_with(|| format!("failed to write report {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }

    if let Some(violation) = &report.invariant_violation {
        eyre::bail!("ledger invariant violated: {violation}");
    }
    let failed = report
        .steps
        .iter()
        .filter(|step| step.status != script::Status::Ok)
        .count();
    if args.strict && failed > 0 {
        eyre::bail!("{failed} of {} calls failed", report.steps.len());
    }
    Ok(())
}
