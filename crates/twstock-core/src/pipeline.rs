//! One fetch unit end to end: fetch, map, clean, validate, write.
//!
//! Units run strictly one after another. A unit that fails at the source or
//! at validation is reported and skipped; the run moves on to the next unit.

use serde::Serialize;
use tracing::{error, info};
use twstock_warehouse::{
    ConnectionRouter, DuckDbConnectionFactory, TableBatch, WarehouseError, WriteMode,
};

use crate::domain::{DataKind, FetchUnit, Venue};
use crate::error::SourceError;
use crate::mapping::{field_mapping, map};
use crate::normalize::normalize;
use crate::schema::{canonical_schema, validate};
use crate::sources::{FetchOutcome, SourceClient};

/// Destination for validated batches.
///
/// `Ok(false)` is a rolled-back write; `Err` means storage is unreachable.
pub trait BatchSink {
    fn store(&mut self, batch: &TableBatch<'_>, mode: WriteMode) -> Result<bool, WarehouseError>;
}

impl BatchSink for ConnectionRouter<DuckDbConnectionFactory> {
    fn store(&mut self, batch: &TableBatch<'_>, mode: WriteMode) -> Result<bool, WarehouseError> {
        self.write_batch(batch, mode)
    }
}

/// What happened to one fetch unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitStatus {
    Written { rows: usize },
    /// The source had nothing, or nothing survived cleaning.
    Empty { reason: String },
    /// At least one row failed the schema; nothing was written.
    Discarded { rows: usize },
    WriteFailed { rows: usize },
    SourceFailed { code: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub kind: DataKind,
    pub venue: Venue,
    pub unit: FetchUnit,
    #[serde(flatten)]
    pub status: UnitStatus,
}

impl UnitReport {
    pub fn rows_written(&self) -> usize {
        match self.status {
            UnitStatus::Written { rows } => rows,
            _ => 0,
        }
    }
}

pub struct Pipeline<S> {
    source: SourceClient,
    sink: S,
}

impl<S: BatchSink> Pipeline<S> {
    pub fn new(source: SourceClient, sink: S) -> Self {
        Self { source, sink }
    }

    pub fn source(&self) -> &SourceClient {
        &self.source
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Every venue of `kind` for every unit, units outermost.
    pub async fn run_kind(
        &mut self,
        kind: DataKind,
        units: &[FetchUnit],
    ) -> Result<Vec<UnitReport>, WarehouseError> {
        let mut reports = Vec::with_capacity(units.len() * kind.venues().len());
        for unit in units {
            for venue in kind.venues() {
                reports.push(self.run_unit(kind, *venue, unit).await?);
            }
        }
        Ok(reports)
    }

    pub async fn run_unit(
        &mut self,
        kind: DataKind,
        venue: Venue,
        unit: &FetchUnit,
    ) -> Result<UnitReport, WarehouseError> {
        let status = self.process(kind, venue, unit).await?;
        Ok(UnitReport {
            kind,
            venue,
            unit: unit.clone(),
            status,
        })
    }

    async fn process(
        &mut self,
        kind: DataKind,
        venue: Venue,
        unit: &FetchUnit,
    ) -> Result<UnitStatus, WarehouseError> {
        let date = unit.to_string();
        info!(
            kind = kind.as_str(),
            venue = venue.as_str(),
            date = %date,
            "fetch unit started"
        );

        let raw = match self.source.fetch(kind, venue, unit).await {
            Ok(FetchOutcome::Rows(table)) => table,
            Ok(FetchOutcome::Empty { reason }) => {
                info!(
                    kind = kind.as_str(),
                    venue = venue.as_str(),
                    date = %date,
                    %reason,
                    "source returned no data"
                );
                return Ok(UnitStatus::Empty { reason });
            }
            Err(error) => return Ok(source_failed(kind, unit, error)),
        };

        let Some(mapping) = field_mapping(kind, venue) else {
            return Ok(source_failed(
                kind,
                unit,
                SourceError::parse(venue, format!("no field mapping for {kind}")),
            ));
        };
        let mapped = match map(&raw, &mapping.strategy) {
            Ok(mapped) => mapped,
            Err(shape) => {
                return Ok(source_failed(
                    kind,
                    unit,
                    SourceError::parse(venue, shape.to_string()),
                ))
            }
        };

        let cleaned = normalize(kind, venue, unit, mapped);
        if cleaned.is_empty() {
            return Ok(UnitStatus::Empty {
                reason: String::from("no rows left after cleaning"),
            });
        }

        let mut validated = validate(&cleaned, kind);
        if validated.is_empty() {
            return Ok(UnitStatus::Discarded {
                rows: cleaned.len(),
            });
        }

        let rows = validated.len();
        let mode = canonical_schema(kind).write_mode;
        let batch = validated.take_batch();
        if self.sink.store(&batch, mode)? {
            info!(
                kind = kind.as_str(),
                venue = venue.as_str(),
                date = %date,
                table = batch.table,
                rows,
                "unit written"
            );
            Ok(UnitStatus::Written { rows })
        } else {
            Ok(UnitStatus::WriteFailed { rows })
        }
    }
}

fn source_failed(kind: DataKind, unit: &FetchUnit, failure: SourceError) -> UnitStatus {
    error!(kind = kind.as_str(), date = %unit, error = %failure, "fetch unit aborted");
    UnitStatus::SourceFailed {
        code: failure.code(),
        message: failure.to_string(),
    }
}
