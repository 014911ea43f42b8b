use twstock_core::{business_dates, run_daily, taipei_today};

use crate::cli::{Cli, DailyArgs};
use crate::error::CliError;

use super::{failed_units, open_pipeline, CommandResult};

pub async fn run(args: &DailyArgs, cli: &Cli) -> Result<CommandResult, CliError> {
    let date = args.date.clone().unwrap_or_else(taipei_today);
    business_dates(&date, &date)?;

    let mut pipeline = open_pipeline(cli)?;
    let report = run_daily(&mut pipeline, &date).await?;

    let failed = report.tasks.iter().map(failed_units).sum();
    Ok(CommandResult::ok(serde_json::to_value(&report)?).with_failed_units(failed))
}
