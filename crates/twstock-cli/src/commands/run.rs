use twstock_core::{plan_task, run_task};

use crate::cli::{Cli, RunArgs};
use crate::error::CliError;

use super::{failed_units, open_pipeline, CommandResult};

pub async fn run(args: &RunArgs, cli: &Cli) -> Result<CommandResult, CliError> {
    // Reject bad names and ranges before touching the warehouse.
    plan_task(&args.task, args.start.as_deref(), args.end.as_deref())?;

    let mut pipeline = open_pipeline(cli)?;
    let report = run_task(
        &mut pipeline,
        &args.task,
        args.start.as_deref(),
        args.end.as_deref(),
    )
    .await?;

    let failed = failed_units(&report);
    Ok(CommandResult::ok(serde_json::to_value(&report)?).with_failed_units(failed))
}
