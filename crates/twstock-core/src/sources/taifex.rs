//! Taiwan Futures Exchange daily CSV download.

use super::{csv_table, FetchOutcome, ACCEPT_LANGUAGE, HTML_ACCEPT};
use crate::calendar::iso_to_slash;
use crate::domain::Venue;
use crate::error::SourceError;
use crate::http_client::{HttpRequest, HttpResponse};

const DOWNLOAD_URL: &str = "https://www.taifex.com.tw/cht/3/futDataDown";

pub(super) fn request(date: &str) -> Result<HttpRequest, SourceError> {
    let slash =
        iso_to_slash(date).map_err(|error| SourceError::fetch(Venue::Taifex, error.to_string()))?;
    Ok(HttpRequest::post(DOWNLOAD_URL)
        .with_header("user-agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64)")
        .with_header("accept", HTML_ACCEPT)
        .with_header("accept-language", ACCEPT_LANGUAGE)
        .with_header("origin", "https://www.taifex.com.tw")
        .with_header("referer", "https://www.taifex.com.tw/cht/3/dlFutDailyMarketView")
        .with_form(&[
            ("down_type", "1"),
            ("commodity_id", "all"),
            ("queryStartDate", &slash),
            ("queryEndDate", &slash),
        ])
        .with_default_charset("big5"))
}

/// The exchange answers a date without trading with an error status, an empty
/// body or an HTML page instead of CSV.
pub(super) fn parse(response: &HttpResponse) -> Result<FetchOutcome, SourceError> {
    if !response.is_success() {
        return Ok(FetchOutcome::empty(format!("HTTP status {}", response.status)));
    }
    let body = response.body.trim_start_matches('\u{feff}').trim();
    if body.is_empty() {
        return Ok(FetchOutcome::empty("empty download"));
    }
    if body.starts_with('<') {
        return Ok(FetchOutcome::empty("no CSV for the date"));
    }
    csv_table(Venue::Taifex, body).map(FetchOutcome::from_table)
}
