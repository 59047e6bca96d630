//! # fixbay-reports
//!
//! ```text
//! fixbay-reports valuation --branch main --bucket 90+
//! fixbay-reports --format json margins --from 2024-01-01 --to 2024-03-31
//! fixbay-reports layers LCD-IP12
//! ```
//!
//! Report output goes to stdout, logs and errors to stderr. Exit code 1 on
//! any error.

use std::io::Write;

use anyhow::Context;
use clap::Parser;

use fixbay_reports::cli::Cli;
use fixbay_reports::render::OutputFormat;
use fixbay_reports::{error_format, init_tracing, resolve_config, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = resolve_config(&cli);
    let format = error_format(&cli, config.as_ref().ok());
    let result = match config {
        Ok(config) => run(&config, &cli.command).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(output) => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", output).context("Failed to write report to stdout")?;
            Ok(())
        }
        Err(err) => {
            tracing::debug!(code = err.code.as_str(), "Report failed");
            match format {
                OutputFormat::Json => {
                    let body = serde_json::to_string(&err).context("Failed to serialize error")?;
                    eprintln!("{}", body);
                }
                OutputFormat::Table => eprintln!("{}", err),
            }
            std::process::exit(1);
        }
    }
}
