//! Taiwan Stock Exchange JSON endpoints.

use serde_json::Value;

use super::{
    json_named_table, json_rows, parse_json, FetchOutcome, ACCEPT_LANGUAGE, BROWSER_USER_AGENT,
    JSON_ACCEPT,
};
use crate::calendar::iso_to_compact;
use crate::domain::{DataKind, Venue};
use crate::error::SourceError;
use crate::http_client::HttpRequest;
use crate::table::Table;

const BASE_URL: &str = "https://www.twse.com.tw";

/// `stat` values meaning the exchange has nothing for the date.
const NO_DATA_STATS: [&str; 3] = [
    "很抱歉，沒有符合條件的資料!",
    "很抱歉，沒有符合條件的資料",
    "查詢日期小於93年2月11日，請重新查詢!",
];

/// Position of the per-stock quote table in the multi-table price payload.
const PRICE_TABLE_INDEX: usize = 8;

pub(super) fn request(kind: DataKind, date: &str) -> Result<HttpRequest, SourceError> {
    let compact =
        iso_to_compact(date).map_err(|error| SourceError::fetch(Venue::Twse, error.to_string()))?;
    let (path, referer) = match kind {
        DataKind::StockPrice => (
            format!("/exchangeReport/MI_INDEX?response=json&date={compact}&type=ALL"),
            "https://www.twse.com.tw/zh/page/trading/exchange/MI_INDEX.html",
        ),
        DataKind::InstitutionalInvestor => (
            format!("/fund/T86?response=json&date={compact}&selectType=ALLBUT0999"),
            "https://www.twse.com.tw/fund/T86",
        ),
        DataKind::MarginShortSale => (
            format!("/exchangeReport/MI_MARGN?response=json&date={compact}&selectType=ALL"),
            "https://www.twse.com.tw/zh/page/trading/exchange/MI_MARGN.html",
        ),
        other => {
            return Err(SourceError::fetch(
                Venue::Twse,
                format!("no TWSE endpoint for {other}"),
            ))
        }
    };

    Ok(HttpRequest::get(format!("{BASE_URL}{path}"))
        .with_header("user-agent", BROWSER_USER_AGENT)
        .with_header("accept", JSON_ACCEPT)
        .with_header("accept-language", ACCEPT_LANGUAGE)
        .with_header("referer", referer)
        .with_header("x-requested-with", "XMLHttpRequest"))
}

pub(super) fn parse(kind: DataKind, body: &str) -> Result<FetchOutcome, SourceError> {
    let payload = parse_json(Venue::Twse, body)?;
    let stat = payload.get("stat").and_then(Value::as_str).unwrap_or_default();
    if NO_DATA_STATS.contains(&stat.trim()) {
        return Ok(FetchOutcome::empty(stat.trim()));
    }

    match kind {
        DataKind::StockPrice => price_table(&payload).map(|table| match table {
            Some(table) => FetchOutcome::from_table(table),
            None => FetchOutcome::empty("no price table for the date"),
        }),
        DataKind::InstitutionalInvestor => {
            let data = payload.get("data");
            if data.and_then(Value::as_array).map_or(true, Vec::is_empty) {
                return Ok(FetchOutcome::empty("no rows"));
            }
            let fields = payload
                .get("fields")
                .ok_or_else(|| SourceError::parse(Venue::Twse, "T86 payload has no fields"))?;
            json_named_table(Venue::Twse, fields, data.unwrap_or(&Value::Null))
                .map(FetchOutcome::from_table)
        }
        DataKind::MarginShortSale => {
            let data = payload
                .get("tables")
                .and_then(|tables| tables.get(1))
                .and_then(|table| table.get("data"))
                .ok_or_else(|| {
                    SourceError::parse(Venue::Twse, "MI_MARGN payload has no tables[1].data")
                })?;
            // Field names repeat across the two halves; cells are taken by position.
            json_rows(Venue::Twse, data)
                .map(|rows| FetchOutcome::from_table(Table::positional(rows)))
        }
        other => Err(SourceError::parse(
            Venue::Twse,
            format!("no TWSE payload for {other}"),
        )),
    }
}

/// The quote table moved between payload layouts over the years.
///
/// `data9`/`fields9` and `data8`/`fields8` are the older layouts; current
/// responses carry a `tables` array. A payload with none of them is malformed.
fn price_table(payload: &Value) -> Result<Option<Table>, SourceError> {
    for (data_key, fields_key) in [("data9", "fields9"), ("data8", "fields8")] {
        if let Some(data) = payload.get(data_key) {
            let fields = payload.get(fields_key).ok_or_else(|| {
                SourceError::parse(Venue::Twse, format!("{data_key} without {fields_key}"))
            })?;
            return json_named_table(Venue::Twse, fields, data).map(Some);
        }
    }

    let Some(tables) = payload.get("tables").and_then(Value::as_array) else {
        return Err(SourceError::parse(
            Venue::Twse,
            "MI_INDEX payload has neither data9, data8 nor tables",
        ));
    };
    let Some(table) = tables.get(PRICE_TABLE_INDEX) else {
        return Ok(None);
    };
    match (table.get("fields"), table.get("data")) {
        (Some(fields), Some(data)) => json_named_table(Venue::Twse, fields, data).map(Some),
        _ => Ok(None),
    }
}
