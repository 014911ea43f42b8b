use serde::Serialize;
use twstock_core::{plan_task, FetchUnit, Task, Venue};

use crate::cli::PlanArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct PlanData {
    task: Task,
    table: &'static str,
    venues: &'static [Venue],
    units: Vec<FetchUnit>,
    /// One request per venue per unit.
    requests: usize,
}

pub fn run(args: &PlanArgs) -> Result<CommandResult, CliError> {
    let (task, units) = plan_task(&args.task, args.start.as_deref(), args.end.as_deref())?;
    let venues = task.kind().venues();
    let data = PlanData {
        task,
        table: task.table_name(),
        venues,
        requests: units.len() * venues.len(),
        units,
    };
    Ok(CommandResult::ok(serde_json::to_value(data)?))
}
