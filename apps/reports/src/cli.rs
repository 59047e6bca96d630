//! # Command Line Interface
//!
//! ```text
//! fixbay-reports [--config FILE] [--db FILE] [--format table|json] <COMMAND>
//!
//!   valuation   Stock valuation with aging buckets
//!   margins     Profit margins from completed invoices
//!   layers      FIFO cost layers and consumption trail for one product
//! ```
//!
//! Dates, methods and buckets arrive as raw strings and are validated by
//! the command, so a bad value produces a `VALIDATION_ERROR` like every
//! other input problem.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::render::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "fixbay-reports", version, about = "Fixbay inventory valuation and margin reports")]
pub struct Cli {
    /// Path to reports.toml
    #[arg(long, global = true, env = "FIXBAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides config and FIXBAY_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Value on-hand stock and bucket it by age
    Valuation(ValuationArgs),

    /// Revenue, cost and gross margin per product
    Margins(MarginArgs),

    /// Cost layers and consumptions for one product
    Layers(LayerArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ValuationArgs {
    /// Only this branch
    #[arg(long)]
    pub branch: Option<String>,

    /// Only this category (case-insensitive)
    #[arg(long)]
    pub category: Option<String>,

    /// fifo | weighted_average
    #[arg(long)]
    pub method: Option<String>,

    /// 0-30 | 31-60 | 61-90 | 90+
    #[arg(long)]
    pub bucket: Option<String>,

    /// Substring of SKU or product name
    #[arg(long)]
    pub search: Option<String>,

    /// Keep rows with nothing on hand
    #[arg(long)]
    pub include_zero: bool,

    /// Valuation date, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub as_of: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct MarginArgs {
    /// Only invoices issued by this branch
    #[arg(long)]
    pub branch: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub search: Option<String>,

    /// First invoice date, YYYY-MM-DD (inclusive)
    #[arg(long)]
    pub from: Option<String>,

    /// Last invoice date, YYYY-MM-DD (inclusive)
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct LayerArgs {
    /// Product id or SKU
    pub product: String,

    #[arg(long)]
    pub branch: Option<String>,

    /// Date used for layer aging, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub as_of: Option<String>,
}
