//! ISIN lookup pages listing every security of a board, Big5 HTML.

use scraper::{ElementRef, Html, Selector};

use super::{FetchOutcome, ACCEPT_LANGUAGE, BROWSER_USER_AGENT, HTML_ACCEPT};
use crate::domain::Venue;
use crate::error::SourceError;
use crate::http_client::HttpRequest;
use crate::table::Table;

const ISIN_URL: &str = "https://isin.twse.com.tw/isin/C_public.jsp";

/// Upper bound on a cell's `colspan`; the pages never come close.
const MAX_COLSPAN: usize = 64;

pub(super) fn request(venue: Venue) -> HttpRequest {
    let mode = match venue {
        Venue::Tpex => 4,
        _ => 2,
    };
    HttpRequest::get(format!("{ISIN_URL}?strMode={mode}"))
        .with_header("user-agent", BROWSER_USER_AGENT)
        .with_header("accept", HTML_ACCEPT)
        .with_header("accept-language", ACCEPT_LANGUAGE)
        .with_default_charset("big5")
}

/// Read the first table of the page; its first row is the header.
///
/// Spanning cells are repeated across the columns they cover, so the section
/// rows (e.g. `股票`) come out with the same text in every column.
pub(super) fn parse(venue: Venue, body: &str) -> Result<FetchOutcome, SourceError> {
    let document = Html::parse_document(body);
    let table = document
        .select(&selector(venue, "table")?)
        .next()
        .ok_or_else(|| SourceError::parse(venue, "ISIN page has no table"))?;

    let row_selector = selector(venue, "tr")?;
    let cell_selector = selector(venue, "td, th")?;
    let mut rows = table
        .select(&row_selector)
        .map(|row| expand_cells(row, &cell_selector))
        .filter(|cells| !cells.is_empty());

    let Some(columns) = rows.next() else {
        return Ok(FetchOutcome::empty("ISIN table is empty"));
    };
    let width = columns.len();
    let rows = rows
        .map(|mut cells| {
            cells.resize(width.max(cells.len()), String::new());
            cells
        })
        .collect();
    Ok(FetchOutcome::from_table(Table::new(columns, rows)))
}

fn selector(venue: Venue, css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css)
        .map_err(|error| SourceError::parse(venue, format!("bad selector {css}: {error}")))
}

fn expand_cells(row: ElementRef<'_>, cell_selector: &Selector) -> Vec<String> {
    let mut cells = Vec::new();
    for cell in row.select(cell_selector) {
        let text = cell.text().collect::<String>().trim().to_string();
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_COLSPAN);
        cells.extend(std::iter::repeat(text).take(span));
    }
    cells
}
