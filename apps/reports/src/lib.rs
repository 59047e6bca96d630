//! # Fixbay Reports
//!
//! Command line front end over the valuation, margin and cost layer
//! aggregators.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Report Run                                        │
//! │                                                                         │
//! │  1. Initialize Logging (stderr) ──────────────────────────────────────► │
//! │     FIXBAY_LOG / RUST_LOG, default "info,fixbay=debug,sqlx=warn"        │
//! │                                                                         │
//! │  2. Load Configuration ───────────────────────────────────────────────► │
//! │     defaults < reports.toml < FIXBAY_* env < command-line flags         │
//! │                                                                         │
//! │  3. Open Database ────────────────────────────────────────────────────► │
//! │     SQLite pool + embedded migrations                                   │
//! │                                                                         │
//! │  4. Run Command ──────────────────────────────────────────────────────► │
//! │     valuation | margins | layers                                        │
//! │                                                                         │
//! │  5. Render ───────────────────────────────────────────────────────────► │
//! │     table or JSON to stdout                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;

use chrono::{Local, NaiveDate};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fixbay_db::{Database, DbConfig};

use crate::cli::{Cli, Commands};
use crate::config::ReportConfig;
use crate::error::ApiError;
use crate::render::{render, OutputFormat};

const DEFAULT_LOG_FILTER: &str = "info,fixbay=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout stays clean for report output.
///
/// ## Log Levels
/// - `FIXBAY_LOG=debug` - Takes precedence over `RUST_LOG`
/// - `RUST_LOG=fixbay_db=trace` - Standard filter syntax
/// - Default: `info,fixbay=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("FIXBAY_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Resolves configuration with the command-line flags applied on top.
pub fn resolve_config(cli: &Cli) -> Result<ReportConfig, ApiError> {
    let mut config = ReportConfig::load(cli.config.clone())?;

    if let Some(path) = &cli.db {
        config.database.path = path.clone();
    }
    if let Some(format) = cli.format {
        config.report.output_format = format;
    }

    Ok(config)
}

/// Output format for error messages: the resolved configuration's when it
/// loaded, otherwise whatever `--format` asked for.
pub fn error_format(cli: &Cli, config: Option<&ReportConfig>) -> OutputFormat {
    match config {
        Some(config) => config.report.output_format,
        None => cli.format.unwrap_or_default(),
    }
}

/// Runs a command against an open database and renders the result.
pub async fn execute(
    db: &Database,
    config: &ReportConfig,
    command: &Commands,
    today: NaiveDate,
) -> Result<String, ApiError> {
    let format = config.report.output_format;

    match command {
        Commands::Valuation(args) => {
            let report = commands::valuation::valuation(db, &config.report, args, today).await?;
            render(&report, format)
        }
        Commands::Margins(args) => {
            let report = commands::margin::margins(db, &config.report, args).await?;
            render(&report, format)
        }
        Commands::Layers(args) => {
            let report = commands::layers::layers(db, &config.report, args, today).await?;
            render(&report, format)
        }
    }
}

/// Opens the database, runs the command and renders the result.
pub async fn run(config: &ReportConfig, command: &Commands) -> Result<String, ApiError> {
    info!(
        path = %config.database.path.display(),
        format = %config.report.output_format,
        "Opening report database"
    );

    let db_config = DbConfig::new(config.database.path.clone())
        .max_connections(config.database.max_connections);
    let db = Database::new(db_config).await?;

    let today = Local::now().date_naive();
    let result = execute(&db, config, command, today).await;

    db.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{LayerArgs, MarginArgs, ValuationArgs};
    use crate::commands::test_support::{database, date, product};
    use fixbay_core::CostingMethod;
    use clap::Parser;

    #[test]
    fn test_missing_config_file_is_config_error() {
        let cli = Cli::try_parse_from([
            "fixbay-reports",
            "--config",
            "/nonexistent/reports.toml",
            "valuation",
        ])
        .unwrap();
        let err = resolve_config(&cli).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigError);
        assert_eq!(error_format(&cli, None), OutputFormat::Table);
    }

    #[test]
    fn test_error_format_follows_resolved_config() {
        let cli = Cli::try_parse_from(["fixbay-reports", "valuation"]).unwrap();
        let config = ReportConfig::from_toml("[report]\noutput_format = \"json\"\n").unwrap();
        assert_eq!(error_format(&cli, Some(&config)), OutputFormat::Json);

        let cli = Cli::try_parse_from(["fixbay-reports", "--format", "json", "valuation"]).unwrap();
        assert_eq!(error_format(&cli, None), OutputFormat::Json);
    }

    #[tokio::test]
    async fn test_execute_renders_json() {
        let db = database().await;
        let mut config = ReportConfig::default();
        config.report.output_format = OutputFormat::Json;

        let out = execute(
            &db,
            &config,
            &Commands::Margins(MarginArgs::default()),
            date(2024, 6, 1),
        )
        .await
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["totals"]["productCount"], 0);
        assert!(json["topPerformer"].is_null());
    }

    #[tokio::test]
    async fn test_execute_uses_configured_branch() {
        let db = database().await;
        db.products()
            .insert(&product("p-1", "BAT-S21", "Batteries", 300, CostingMethod::Fifo))
            .await
            .unwrap();
        for (id, branch) in [("L1", "main"), ("N1", "north")] {
            sqlx::query(
                r#"
                INSERT INTO cost_layers (
                    id, product_id, branch_id, source_type, grn_id, received_qty,
                    remaining_qty, unit_cost_cents, received_date, is_exhausted, created_at
                ) VALUES (?1, 'p-1', ?2, 'grn', NULL, 4, 4, 250, '2024-05-01', 0,
                          '2024-05-01T08:00:00+00:00')
                "#,
            )
            .bind(id)
            .bind(branch)
            .execute(db.pool())
            .await
            .unwrap();
        }

        let mut config = ReportConfig::default();
        config.report.output_format = OutputFormat::Json;
        config.report.branch_id = Some("north".to_string());

        let command = Commands::Layers(LayerArgs {
            product: "p-1".to_string(),
            ..Default::default()
        });
        let out = execute(&db, &config, &command, date(2024, 6, 1)).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        let branches: Vec<&str> = json["layers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["layer"]["branch_id"].as_str().unwrap())
            .collect();
        assert_eq!(branches, vec!["north"]);
    }

    #[tokio::test]
    async fn test_execute_renders_table() {
        let db = database().await;
        let out = execute(
            &db,
            &ReportConfig::default(),
            &Commands::Valuation(ValuationArgs::default()),
            date(2024, 6, 1),
        )
        .await
        .unwrap();
        assert!(out.starts_with("Stock valuation as of 2024-06-01"));
    }
}
