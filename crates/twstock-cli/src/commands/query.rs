use twstock_core::{Task, Warehouse};

use crate::cli::{Cli, QueryArgs};
use crate::error::CliError;

use super::{warehouse_config, CommandResult};

pub fn run(args: &QueryArgs, cli: &Cli) -> Result<CommandResult, CliError> {
    let id = args.id.trim();
    if id.is_empty() {
        return Err(CliError::Command(String::from("id must not be empty")));
    }

    let table = match args.table.parse::<Task>() {
        Ok(task) => task.table_name(),
        Err(_) => args.table.as_str(),
    };

    let warehouse = Warehouse::open(warehouse_config(cli))?;
    let result = warehouse.lookup(
        table,
        id,
        args.start.as_deref(),
        args.end.as_deref(),
        args.max_rows,
    )?;

    Ok(CommandResult::ok(serde_json::to_value(result)?))
}
