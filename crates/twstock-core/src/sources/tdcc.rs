//! TDCC open-data shareholding distribution, always the latest week.

use super::{csv_table, FetchOutcome, BROWSER_USER_AGENT};
use crate::domain::Venue;
use crate::error::SourceError;
use crate::http_client::{HttpRequest, HttpResponse};

const OPEN_DATA_URL: &str = "https://opendata.tdcc.com.tw/getOD.ashx?id=1-5";

pub(super) fn request() -> HttpRequest {
    HttpRequest::get(OPEN_DATA_URL).with_header("user-agent", BROWSER_USER_AGENT)
}

pub(super) fn parse(response: &HttpResponse) -> Result<FetchOutcome, SourceError> {
    if !response.is_success() {
        return Err(SourceError::fetch(
            Venue::Tdcc,
            format!("HTTP status {}", response.status),
        ));
    }
    csv_table(Venue::Tdcc, &response.body).map(FetchOutcome::from_table)
}
