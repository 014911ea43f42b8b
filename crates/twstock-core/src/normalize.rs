//! Cell cleaning between mapping and validation.
//!
//! Numeric columns come out as plain decimal strings; the validator does the
//! final type coercion. Placeholder tokens always become `0`.

use crate::calendar::compact_to_iso;
use crate::domain::{DataKind, FetchUnit, Venue};
use crate::schema::{canonical_schema, FieldType};
use crate::table::Table;

/// Source markers that stand for "no value" in a numeric column.
pub const PLACEHOLDER_TOKENS: [&str; 10] = [
    "", "-", "--", "---", "----", "X", "+", "除息", "除權", "除權息",
];

/// Default for a blank industry classification.
pub const UNKNOWN_INDUSTRY: &str = "未知";

pub const SESSION_REGULAR: &str = "Position";
pub const SESSION_AFTER_HOURS: &str = "AfterMarket";

pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    PLACEHOLDER_TOKENS.contains(&trimmed)
        || (!trimmed.is_empty() && trimmed.chars().all(|c| c == '-'))
}

/// `"1,234,567"` -> `"1234567"`, `"X0.00"` -> `"0.00"`, `"--"` -> `"0"`.
pub fn clean_number(raw: &str) -> String {
    if is_placeholder(raw) {
        return String::from("0");
    }
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | 'X' | '+') && !c.is_whitespace())
        .collect();
    if is_placeholder(&cleaned) {
        String::from("0")
    } else {
        cleaned
    }
}

/// `"-1.25%"` -> `"-1.25"`
pub fn clean_percent(raw: &str) -> String {
    clean_number(raw.trim().trim_end_matches('%'))
}

/// Split `"2330　台積電"` into code and name at the first whitespace run.
pub fn split_code_name(cell: &str) -> (String, String) {
    let trimmed = cell.trim();
    match trimmed.find(char::is_whitespace) {
        Some(at) => (
            trimmed[..at].to_string(),
            trimmed[at..].trim_start().to_string(),
        ),
        None => (trimmed.to_string(), String::new()),
    }
}

pub fn trading_session(raw: &str) -> &'static str {
    match raw.trim() {
        "盤後" => SESSION_AFTER_HOURS,
        _ => SESSION_REGULAR,
    }
}

/// Text of an HTML fragment such as `<p style="color:red">+</p>`.
fn inner_text(fragment: &str) -> String {
    let mut text = String::new();
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.trim().to_string()
}

/// Apply the direction marker to an unsigned change value.
pub fn signed_change(direction: &str, change: &str) -> String {
    let change = clean_number(change);
    if inner_text(direction) == "-" && !change.starts_with('-') {
        format!("-{change}")
    } else {
        change
    }
}

/// Every compared cell carries the same text: a repeated header row.
pub fn is_header_leak(cells: &[&str]) -> bool {
    cells.windows(2).all(|pair| pair[0].trim() == pair[1].trim())
}

pub fn is_numeric_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Clean a mapped table for `kind` as published by `venue` for `unit`.
pub fn normalize(kind: DataKind, venue: Venue, unit: &FetchUnit, mut table: Table) -> Table {
    if kind == DataKind::StockInfo {
        split_stock_info(&mut table, venue);
    }

    for field in canonical_schema(kind).fields {
        match field.ty {
            FieldType::Integer => table.map_column(field.name, clean_number),
            FieldType::Float => table.map_column(field.name, clean_percent),
            FieldType::Text | FieldType::Date => {
                table.map_column(field.name, |cell| cell.trim().to_string())
            }
        }
    }

    match kind {
        DataKind::StockPrice => {
            if let (Some(direction), Some(change)) =
                (table.column_index("Dir"), table.column_index("Change"))
            {
                for row in &mut table.rows {
                    if let (Some(dir), Some(value)) = (row.get(direction), row.get(change)) {
                        let signed = signed_change(dir, value);
                        row[change] = signed;
                    }
                }
            }
            table.drop_column("Dir");
        }
        DataKind::FuturesDaily => {
            table.map_column("ContractDate", |cell| {
                cell.chars().filter(|c| !c.is_whitespace()).collect()
            });
            if table.has_column("TradingSession") {
                table.map_column("TradingSession", |cell| trading_session(cell).to_string());
            } else {
                table.set_constant("TradingSession", SESSION_REGULAR);
            }
        }
        DataKind::TdccShareholding => {
            table.map_column("Date", |cell| {
                compact_to_iso(cell).unwrap_or_else(|_| cell.to_string())
            });
            table.map_column("StockID", |cell| cell.trim_start_matches('0').to_string());
        }
        DataKind::StockInfo | DataKind::InstitutionalInvestor | DataKind::MarginShortSale => {}
    }

    if let Some(date) = unit.date() {
        if kind.is_dated() {
            table.set_constant("Date", date);
        }
    }
    table
}

fn split_stock_info(table: &mut Table, venue: Venue) {
    let (Some(code_name), Some(market), Some(industry)) = (
        table.column_index("StockCodeName"),
        table.column_index("MarketType"),
        table.column_index("IndustryType"),
    ) else {
        return;
    };

    table.retain_rows(|row| {
        let cell = |index: usize| row.get(index).map(String::as_str).unwrap_or_default();
        !is_header_leak(&[cell(code_name), cell(market), cell(industry)])
    });
    table.push_column("StockID", |row| split_code_name(&row[code_name]).0);
    table.push_column("StockName", |row| split_code_name(&row[code_name]).1);
    table.drop_column("StockCodeName");

    if let Some(id) = table.column_index("StockID") {
        table.retain_rows(|row| row.get(id).is_some_and(|value| is_numeric_id(value)));
    }
    table.set_constant("MarketType", venue.as_str());
    table.map_column("IndustryType", |cell| {
        if cell.trim().is_empty() {
            UNKNOWN_INDUSTRY.to_string()
        } else {
            cell.trim().to_string()
        }
    });
}
