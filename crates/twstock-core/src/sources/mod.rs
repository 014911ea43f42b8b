//! Outbound requests to the exchanges and decoding of their payloads.
//!
//! Request builders and payload parsers are pure functions per venue; the
//! [`SourceClient`] adds pacing and transport around them.

mod isin;
mod taifex;
mod tdcc;
mod tpex;
mod twse;

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::domain::{DataKind, FetchUnit, Venue};
use crate::error::SourceError;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::table::Table;

pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/71.0.3578.98 Safari/537.36";
pub(crate) const JSON_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";
pub(crate) const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub(crate) const ACCEPT_LANGUAGE: &str = "zh-TW,zh;q=0.9,en-US;q=0.8,en;q=0.7";

/// Result of one successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Rows(Table),
    /// The source answered but had nothing for this unit.
    Empty { reason: String },
}

impl FetchOutcome {
    pub(crate) fn empty(reason: impl Into<String>) -> Self {
        Self::Empty {
            reason: reason.into(),
        }
    }

    /// Rows, or `Empty` when the table has none.
    pub(crate) fn from_table(table: Table) -> Self {
        if table.is_empty() {
            Self::empty("no rows")
        } else {
            Self::Rows(table)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }
}

/// Paced client for every (kind, venue) source.
#[derive(Clone)]
pub struct SourceClient {
    http: Arc<dyn HttpClient>,
    config: PipelineConfig,
}

impl SourceClient {
    pub fn new(http: Arc<dyn HttpClient>, config: PipelineConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetch one unit. Sleeps the request delay first, every time.
    pub async fn fetch(
        &self,
        kind: DataKind,
        venue: Venue,
        unit: &FetchUnit,
    ) -> Result<FetchOutcome, SourceError> {
        let request = build_request(kind, venue, unit)?
            .with_timeout_ms(self.config.request_timeout_ms());

        debug!(
            delay_ms = u64::try_from(self.config.request_delay.as_millis()).unwrap_or(u64::MAX),
            "pacing before request"
        );
        tokio::time::sleep(self.config.request_delay).await;

        debug!(url = %request.url, method = ?request.method, "sending request");
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|error| SourceError::fetch(venue, error.message()))?;

        parse_response(kind, venue, &response)
    }
}

/// The request for one unit, without timeout or pacing applied.
pub fn build_request(
    kind: DataKind,
    venue: Venue,
    unit: &FetchUnit,
) -> Result<HttpRequest, SourceError> {
    match (venue, unit) {
        (Venue::Twse, FetchUnit::Date(date)) if kind.is_dated() => twse::request(kind, date),
        (Venue::Tpex, FetchUnit::Date(date)) if kind.is_dated() => tpex::request(kind, date),
        (Venue::Taifex, FetchUnit::Date(date)) if kind == DataKind::FuturesDaily => {
            taifex::request(date)
        }
        (Venue::Twse | Venue::Tpex, FetchUnit::Latest) if kind == DataKind::StockInfo => {
            Ok(isin::request(venue))
        }
        (Venue::Tdcc, FetchUnit::Latest) if kind == DataKind::TdccShareholding => {
            Ok(tdcc::request())
        }
        _ => Err(SourceError::fetch(
            venue,
            format!("{kind} is not published by {venue} for unit '{unit}'"),
        )),
    }
}

/// Decode a response into rows or an empty outcome.
pub fn parse_response(
    kind: DataKind,
    venue: Venue,
    response: &HttpResponse,
) -> Result<FetchOutcome, SourceError> {
    match venue {
        // Non-2xx from the futures download means "nothing for that date".
        Venue::Taifex => return taifex::parse(response),
        Venue::Tdcc => return tdcc::parse(response),
        Venue::Twse | Venue::Tpex => {}
    }
    if !response.is_success() {
        return Err(SourceError::fetch(
            venue,
            format!("HTTP status {}", response.status),
        ));
    }
    match (kind, venue) {
        (DataKind::StockInfo, _) => isin::parse(venue, &response.body),
        (_, Venue::Twse) => twse::parse(kind, &response.body),
        _ => tpex::parse(kind, &response.body),
    }
}

pub(crate) fn parse_json(venue: Venue, body: &str) -> Result<Value, SourceError> {
    serde_json::from_str(body)
        .map_err(|error| SourceError::parse(venue, format!("invalid JSON payload: {error}")))
}

/// A cell as text: strings verbatim, numbers in their JSON spelling, null empty.
pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `[[cell, ...], ...]` into rows.
pub(crate) fn json_rows(venue: Venue, data: &Value) -> Result<Vec<Vec<String>>, SourceError> {
    let rows = data
        .as_array()
        .ok_or_else(|| SourceError::parse(venue, "data is not an array"))?;
    rows.iter()
        .map(|row| {
            row.as_array()
                .map(|cells| cells.iter().map(cell_text).collect())
                .ok_or_else(|| SourceError::parse(venue, "data row is not an array"))
        })
        .collect()
}

/// A labelled table from parallel `fields` and `data` members.
pub(crate) fn json_named_table(
    venue: Venue,
    fields: &Value,
    data: &Value,
) -> Result<Table, SourceError> {
    let columns = fields
        .as_array()
        .ok_or_else(|| SourceError::parse(venue, "fields is not an array"))?
        .iter()
        .map(cell_text)
        .collect();
    Ok(Table::new(columns, json_rows(venue, data)?))
}

/// Parse a CSV download whose first record is the header.
///
/// Short records are padded with empty cells; blank records are skipped.
pub(crate) fn csv_table(venue: Venue, body: &str) -> Result<Table, SourceError> {
    let body = body.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|error| SourceError::parse(venue, format!("invalid CSV header: {error}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|error| SourceError::parse(venue, format!("invalid CSV record: {error}")))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.len() < columns.len() {
            row.resize(columns.len(), String::new());
        }
        rows.push(row);
    }
    Ok(Table::new(columns, rows))
}
