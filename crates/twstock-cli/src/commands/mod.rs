mod daily;
mod plan;
mod query;
mod run;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use twstock_core::{
    Pipeline, PipelineConfig, ReqwestHttpClient, SourceClient, TaskReport, UnitStatus, Warehouse,
    WarehouseConfig,
};
use twstock_warehouse::{ConnectionRouter, DuckDbConnectionFactory};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    /// Units that failed at the source or in storage.
    pub failed_units: usize,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            failed_units: 0,
        }
    }

    pub fn with_failed_units(mut self, failed_units: usize) -> Self {
        self.failed_units = failed_units;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    match &cli.command {
        Command::Run(args) => run::run(args, cli).await,
        Command::Daily(args) => daily::run(args, cli).await,
        Command::Plan(args) => plan::run(args),
        Command::Query(args) => query::run(args, cli),
    }
}

type LivePipeline = Pipeline<ConnectionRouter<DuckDbConnectionFactory>>;

fn warehouse_config(cli: &Cli) -> WarehouseConfig {
    let config = WarehouseConfig::default();
    match &cli.db_path {
        Some(path) => config.with_db_path(path),
        None => config,
    }
}

fn pipeline_config(cli: &Cli) -> PipelineConfig {
    PipelineConfig {
        request_delay: Duration::from_millis(cli.request_delay_ms),
        stage_delay: Duration::from_millis(cli.stage_delay_ms),
        request_timeout: Duration::from_millis(cli.timeout_ms),
        reconnect_backoff: Duration::from_millis(cli.reconnect_backoff_ms),
        max_reconnect_attempts: cli.max_reconnect_attempts,
    }
}

/// Open the warehouse (creating its tables) and wire the live HTTP client.
fn open_pipeline(cli: &Cli) -> Result<LivePipeline, CliError> {
    let config = pipeline_config(cli);
    let warehouse = Warehouse::open(warehouse_config(cli))?;
    let router = warehouse.router(config.router_config());
    let source = SourceClient::new(Arc::new(ReqwestHttpClient::new()), config);
    Ok(Pipeline::new(source, router))
}

fn failed_units(report: &TaskReport) -> usize {
    report.count(|status| {
        matches!(
            status,
            UnitStatus::SourceFailed { .. } | UnitStatus::WriteFailed { .. }
        )
    })
}
