//! Taipei Exchange JSON endpoints. Dates are sent in the ROC calendar.

use serde_json::Value;

use super::{
    json_named_table, json_rows, parse_json, FetchOutcome, ACCEPT_LANGUAGE, BROWSER_USER_AGENT,
    JSON_ACCEPT,
};
use crate::calendar::iso_to_roc;
use crate::domain::{DataKind, Venue};
use crate::error::SourceError;
use crate::http_client::HttpRequest;
use crate::table::Table;

const BASE_URL: &str = "https://www.tpex.org.tw/web/stock";

pub(super) fn request(kind: DataKind, date: &str) -> Result<HttpRequest, SourceError> {
    let roc =
        iso_to_roc(date).map_err(|error| SourceError::fetch(Venue::Tpex, error.to_string()))?;
    let roc = urlencoding::encode(&roc);
    let (path, referer) = match kind {
        DataKind::StockPrice => (
            format!("/aftertrading/otc_quotes_no1430/stk_wn1430_result.php?l=zh-tw&d={roc}&se=AL"),
            "/aftertrading/otc_quotes_no1430/stk_wn1430.php?l=zh-tw",
        ),
        DataKind::InstitutionalInvestor => (
            format!("/3insti/daily_trade/3itrade_hedge_result.php?l=zh-tw&o=json&t=D&d={roc}"),
            "/3insti/daily_trade/3itrade_hedge.php?l=zh-tw",
        ),
        DataKind::MarginShortSale => (
            format!(
                "/margin_trading/margin_balance/margin_bal_result.php?l=zh-tw&o=json&t=D&d={roc}"
            ),
            "/margin_trading/margin_balance/margin_bal.php?l=zh-tw",
        ),
        other => {
            return Err(SourceError::fetch(
                Venue::Tpex,
                format!("no TPEX endpoint for {other}"),
            ))
        }
    };

    Ok(HttpRequest::get(format!("{BASE_URL}{path}"))
        .with_header("user-agent", BROWSER_USER_AGENT)
        .with_header("accept", JSON_ACCEPT)
        .with_header("accept-language", ACCEPT_LANGUAGE)
        .with_header("referer", format!("{BASE_URL}{referer}"))
        .with_header("x-requested-with", "XMLHttpRequest"))
}

pub(super) fn parse(kind: DataKind, body: &str) -> Result<FetchOutcome, SourceError> {
    let payload = parse_json(Venue::Tpex, body)?;
    let tables = payload
        .get("tables")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::parse(Venue::Tpex, "payload has no tables array"))?;
    let Some(first) = tables.first() else {
        return Ok(FetchOutcome::empty("no tables"));
    };
    let data = first.get("data").unwrap_or(&Value::Null);
    if data.as_array().map_or(true, Vec::is_empty) {
        return Ok(FetchOutcome::empty("no rows"));
    }

    match kind {
        DataKind::StockPrice | DataKind::InstitutionalInvestor => json_rows(Venue::Tpex, data)
            .map(|rows| FetchOutcome::from_table(Table::positional(rows))),
        DataKind::MarginShortSale => {
            let fields = first
                .get("fields")
                .ok_or_else(|| SourceError::parse(Venue::Tpex, "margin table has no fields"))?;
            json_named_table(Venue::Tpex, fields, data).map(FetchOutcome::from_table)
        }
        other => Err(SourceError::parse(
            Venue::Tpex,
            format!("no TPEX payload for {other}"),
        )),
    }
}
