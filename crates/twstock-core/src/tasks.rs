//! Named entry points invoked by the external scheduler.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Serialize, Serializer};
use tracing::{debug, info};
use uuid::Uuid;

use crate::calendar::business_dates;
use crate::domain::{DataKind, FetchUnit};
use crate::error::{RunError, TaskError};
use crate::pipeline::{BatchSink, Pipeline, UnitReport, UnitStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    StockInfo,
    ShareHolding,
    StockPrice,
    InstitutionalInvestor,
    MarginShortSale,
    FutureDaily,
}

impl Task {
    /// Daily run order: reference data first, then the per-date kinds.
    pub const ALL: [Task; 6] = [
        Self::StockInfo,
        Self::ShareHolding,
        Self::StockPrice,
        Self::InstitutionalInvestor,
        Self::MarginShortSale,
        Self::FutureDaily,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StockInfo => "stock-info",
            Self::ShareHolding => "share-holding",
            Self::StockPrice => "stock-price",
            Self::InstitutionalInvestor => "institutional-investor",
            Self::MarginShortSale => "margin-short-sale",
            Self::FutureDaily => "future-daily",
        }
    }

    /// Name used by existing scheduler definitions; matches the table name.
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::StockInfo => "taiwan_stock_info",
            Self::ShareHolding => "taiwan_share_holding",
            Self::StockPrice => "taiwan_stock_price",
            Self::InstitutionalInvestor => "taiwan_institutional_investor",
            Self::MarginShortSale => "taiwan_margin_short_sale",
            Self::FutureDaily => "taiwan_future_daily",
        }
    }

    pub const fn kind(self) -> DataKind {
        match self {
            Self::StockInfo => DataKind::StockInfo,
            Self::ShareHolding => DataKind::TdccShareholding,
            Self::StockPrice => DataKind::StockPrice,
            Self::InstitutionalInvestor => DataKind::InstitutionalInvestor,
            Self::MarginShortSale => DataKind::MarginShortSale,
            Self::FutureDaily => DataKind::FuturesDaily,
        }
    }

    pub const fn requires_dates(self) -> bool {
        self.kind().is_dated()
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = TaskError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|task| task.as_str() == wanted || task.table_name() == wanted)
            .ok_or_else(|| TaskError::UnknownTask {
                name: value.to_string(),
            })
    }
}

impl Serialize for Task {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Outcome of one task: every fetch unit it attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub run_id: Uuid,
    pub task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    pub rows_written: usize,
    pub units: Vec<UnitReport>,
}

impl TaskReport {
    pub fn count(&self, matches: impl Fn(&UnitStatus) -> bool) -> usize {
        self.units.iter().filter(|unit| matches(&unit.status)).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyReport {
    pub run_id: Uuid,
    pub date: String,
    pub rows_written: usize,
    pub tasks: Vec<TaskReport>,
}

/// Resolve what a task needs before any request goes out.
pub fn plan_task(
    name: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(Task, Vec<FetchUnit>), TaskError> {
    let task = name.parse::<Task>()?;
    if !task.requires_dates() {
        if start.is_some() || end.is_some() {
            debug!(task = task.as_str(), "ignoring dates for a snapshot task");
        }
        return Ok((task, vec![FetchUnit::Latest]));
    }

    let (Some(start), Some(end)) = (start, end) else {
        return Err(TaskError::MissingDateRange {
            task: task.as_str(),
        });
    };
    let units = business_dates(start, end)?
        .into_iter()
        .map(FetchUnit::Date)
        .collect();
    Ok((task, units))
}

/// Run one named task over an optional inclusive date range.
pub async fn run_task<S: BatchSink>(
    pipeline: &mut Pipeline<S>,
    name: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<TaskReport, RunError> {
    let (task, units) = plan_task(name, start, end)?;
    let (start, end) = if task.requires_dates() {
        (start.map(str::to_string), end.map(str::to_string))
    } else {
        (None, None)
    };
    execute(pipeline, Uuid::new_v4(), task, &units, start, end).await
}

/// Every task for one date, in [`Task::ALL`] order, pausing between tasks.
pub async fn run_daily<S: BatchSink>(
    pipeline: &mut Pipeline<S>,
    date: &str,
) -> Result<DailyReport, RunError> {
    let dates = business_dates(date, date)?;
    let run_id = Uuid::new_v4();
    let stage_delay = pipeline.source().config().stage_delay;
    info!(%run_id, date, trading_day = !dates.is_empty(), "daily run started");

    let mut tasks = Vec::with_capacity(Task::ALL.len());
    for (index, task) in Task::ALL.into_iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(stage_delay).await;
        }
        let (units, start, end) = if task.requires_dates() {
            (
                dates.iter().cloned().map(FetchUnit::Date).collect::<Vec<_>>(),
                Some(date.to_string()),
                Some(date.to_string()),
            )
        } else {
            (vec![FetchUnit::Latest], None, None)
        };
        tasks.push(execute(pipeline, run_id, task, &units, start, end).await?);
    }

    Ok(DailyReport {
        run_id,
        date: date.to_string(),
        rows_written: tasks.iter().map(|task| task.rows_written).sum(),
        tasks,
    })
}

async fn execute<S: BatchSink>(
    pipeline: &mut Pipeline<S>,
    run_id: Uuid,
    task: Task,
    units: &[FetchUnit],
    start: Option<String>,
    end: Option<String>,
) -> Result<TaskReport, RunError> {
    info!(%run_id, task = task.as_str(), units = units.len(), "task started");
    let reports = pipeline.run_kind(task.kind(), units).await?;
    let rows_written = reports.iter().map(UnitReport::rows_written).sum();
    info!(%run_id, task = task.as_str(), rows = rows_written, "task finished");

    Ok(TaskReport {
        run_id,
        task,
        start,
        end,
        rows_written,
        units: reports,
    })
}
