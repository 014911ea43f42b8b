//! CLI argument definitions for twstock.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Run one named task over a date range |
//! | `daily` | Run every task for a single date |
//! | `plan` | Show the fetch units a task would cover |
//! | `query` | Read stored rows for one identifier |
//!
//! # Examples
//!
//! ```bash
//! twstock run stock-price 2024-01-02 2024-01-05
//! twstock run stock-info
//! twstock daily --date 2024-01-05 --pretty
//! twstock query taiwan_stock_price 2330 --start 2024-01-01
//! ```

use clap::{Args, Parser, Subcommand};
use twstock_core::DEFAULT_MAX_ROWS;

/// Daily ETL for Taiwan exchange, OTC, futures and depository data.
#[derive(Debug, Parser)]
#[command(
    name = "twstock",
    author,
    version,
    about = "Daily ETL for Taiwan stock market data"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Warehouse file; defaults to TWSTOCK_DB_PATH or ~/.twstock/warehouse.duckdb.
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Pause before every outbound request, in milliseconds.
    #[arg(long, global = true, default_value_t = 5_000)]
    pub request_delay_ms: u64,

    /// Pause between the tasks of a daily run, in milliseconds.
    #[arg(long, global = true, default_value_t = 3_000)]
    pub stage_delay_ms: u64,

    /// Request timeout budget in milliseconds.
    #[arg(long, global = true, default_value_t = 30_000)]
    pub timeout_ms: u64,

    /// Wait between storage reconnect attempts, in milliseconds.
    #[arg(long, global = true, default_value_t = 1_000)]
    pub reconnect_backoff_ms: u64,

    /// Give up after this many reconnect attempts; retries forever when unset.
    #[arg(long, global = true)]
    pub max_reconnect_attempts: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one named task.
    ///
    /// Dated tasks need both dates. Snapshot tasks (stock-info,
    /// share-holding) ignore them.
    ///
    /// # Examples
    ///
    ///   twstock run stock-price 2024-01-02 2024-01-05
    ///   twstock run taiwan_margin_short_sale 2024-01-05 2024-01-05
    ///   twstock run share-holding
    Run(RunArgs),

    /// Run every task for one date in dependency order.
    Daily(DailyArgs),

    /// Resolve a task and its fetch units without sending any request.
    Plan(PlanArgs),

    /// Read rows of a destination table for one stock or contract.
    Query(QueryArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Task name or its table name.
    pub task: String,

    /// First date, YYYY-MM-DD.
    pub start: Option<String>,

    /// Last date, YYYY-MM-DD, inclusive.
    pub end: Option<String>,
}

#[derive(Debug, Args)]
pub struct DailyArgs {
    /// Date to run, YYYY-MM-DD. Defaults to today in Asia/Taipei.
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    pub task: String,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Destination table, or the task that fills it.
    pub table: String,

    /// StockID, or FuturesID for futures.
    pub id: String,

    #[arg(long)]
    pub start: Option<String>,

    #[arg(long)]
    pub end: Option<String>,

    /// Maximum number of rows to return.
    #[arg(long, default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: usize,
}
