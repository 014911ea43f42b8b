//! Core of the twstock daily ETL pipeline.
//!
//! This crate contains:
//! - Trading-date planning and ROC calendar conversion
//! - Paced source clients for TWSE, TPEX, TAIFEX, TDCC and the ISIN pages
//! - Field mapping tables, value normalization and fail-closed schema validation
//! - Unit orchestration and the named task entry points

pub mod calendar;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod mapping;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod sources;
pub mod table;
pub mod tasks;

pub use calendar::{business_dates, iso_to_roc, roc_to_iso, taipei_today};
pub use config::PipelineConfig;
pub use domain::{DataKind, FetchUnit, Venue};
pub use error::{RunError, SchemaViolation, SourceError, TaskError, ValidationError};
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient,
};
pub use mapping::{field_mapping, map, FieldMapping, MappingStrategy, ShapeError};
pub use normalize::normalize;
pub use pipeline::{BatchSink, Pipeline, UnitReport, UnitStatus};
pub use schema::{
    canonical_schema, try_validate, validate, CanonicalSchema, FieldSpec, FieldType, FieldValue,
    ValidatedTable,
};
pub use sources::{FetchOutcome, SourceClient};
pub use table::Table;
pub use tasks::{plan_task, run_daily, run_task, DailyReport, Task, TaskReport};
pub use twstock_warehouse::{
    QueryResult, RouterConfig, SqlColumn, Warehouse, WarehouseConfig, WarehouseError,
    DEFAULT_MAX_ROWS,
};
