use thiserror::Error;

use crate::domain::Venue;

/// Input validation errors exposed by `twstock-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid date range {start}..{end}: {reason}")]
    InvalidDateRange {
        start: String,
        end: String,
        reason: String,
    },

    #[error("date must be ISO-8601 YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },

    #[error("date must be ROC calendar YYY/MM/DD: '{value}'")]
    InvalidRocDate { value: String },

    #[error("date must be compact YYYYMMDD: '{value}'")]
    InvalidCompactDate { value: String },
}

/// Failures of a single source request. Empty results are not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Transport or HTTP status failure.
    #[error("fetch from {venue} failed: {message}")]
    Fetch { venue: Venue, message: String },

    /// The response arrived but did not have the expected shape.
    #[error("unexpected {venue} payload: {message}")]
    Parse { venue: Venue, message: String },
}

impl SourceError {
    pub fn fetch(venue: Venue, message: impl Into<String>) -> Self {
        Self::Fetch {
            venue,
            message: message.into(),
        }
    }

    pub fn parse(venue: Venue, message: impl Into<String>) -> Self {
        Self::Parse {
            venue,
            message: message.into(),
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch_error",
            Self::Parse { .. } => "parse_error",
        }
    }
}

/// First row that kept a batch from validating.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("row {row}: field '{field}' {reason}")]
pub struct SchemaViolation {
    pub row: usize,
    pub field: &'static str,
    pub reason: String,
}

/// Errors raised by task dispatch before any work starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("unknown task '{name}', expected one of stock-info, share-holding, stock-price, institutional-investor, margin-short-sale, future-daily")]
    UnknownTask { name: String },

    #[error("task '{task}' requires both a start date and an end date")]
    MissingDateRange { task: &'static str },

    #[error(transparent)]
    InvalidDateRange(#[from] ValidationError),
}

/// Errors that stop a task run after it started.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Task(#[from] TaskError),

    /// Only reachable when a reconnect ceiling is configured.
    #[error(transparent)]
    Storage(#[from] twstock_warehouse::WarehouseError),
}

impl From<ValidationError> for RunError {
    fn from(error: ValidationError) -> Self {
        Self::Task(TaskError::InvalidDateRange(error))
    }
}
