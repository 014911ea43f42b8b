//! Canonical record schemas and the fail-closed batch validator.
//!
//! A batch validates only if every row carries every canonical field with a
//! value coercible to the declared type. One bad row discards the whole batch.

use tracing::warn;
use twstock_warehouse::{DuckValue, TableBatch, WriteMode};

use crate::calendar::parse_iso;
use crate::domain::DataKind;
use crate::error::SchemaViolation;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Float,
    /// ISO-8601 `YYYY-MM-DD`, stored as text.
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Text,
    }
}

const fn int(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Integer,
    }
}

const fn float(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Float,
    }
}

const fn date(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Date,
    }
}

/// Target field set of one data kind and where it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalSchema {
    pub kind: DataKind,
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    pub write_mode: WriteMode,
}

impl CanonicalSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.name).collect()
    }
}

const STOCK_PRICE: CanonicalSchema = CanonicalSchema {
    kind: DataKind::StockPrice,
    table: "taiwan_stock_price",
    fields: &[
        text("StockID"),
        int("TradeVolume"),
        int("Transaction"),
        int("TradeValue"),
        float("Open"),
        float("Max"),
        float("Min"),
        float("Close"),
        float("Change"),
        date("Date"),
    ],
    write_mode: WriteMode::Append,
};

const FUTURES_DAILY: CanonicalSchema = CanonicalSchema {
    kind: DataKind::FuturesDaily,
    table: "taiwan_future_daily",
    fields: &[
        date("Date"),
        text("FuturesID"),
        text("ContractDate"),
        float("Open"),
        float("Max"),
        float("Min"),
        float("Close"),
        float("Change"),
        float("ChangePer"),
        float("Volume"),
        float("SettlementPrice"),
        int("OpenInterest"),
        text("TradingSession"),
    ],
    write_mode: WriteMode::Append,
};

const STOCK_INFO: CanonicalSchema = CanonicalSchema {
    kind: DataKind::StockInfo,
    table: "taiwan_stock_info",
    fields: &[
        text("StockID"),
        text("StockName"),
        text("MarketType"),
        text("IndustryType"),
    ],
    write_mode: WriteMode::Upsert,
};

const INSTITUTIONAL_INVESTOR: CanonicalSchema = CanonicalSchema {
    kind: DataKind::InstitutionalInvestor,
    table: "taiwan_institutional_investor",
    fields: &[
        text("StockID"),
        text("StockName"),
        int("ForeignBuy"),
        int("ForeignSell"),
        int("ForeignNet"),
        int("ForeignDealerBuy"),
        int("ForeignDealerSell"),
        int("ForeignDealerNet"),
        int("InvestmentTrustBuy"),
        int("InvestmentTrustSell"),
        int("InvestmentTrustNet"),
        int("DealerSelfBuy"),
        int("DealerSelfSell"),
        int("DealerSelfNet"),
        int("DealerHedgeBuy"),
        int("DealerHedgeSell"),
        int("DealerHedgeNet"),
        int("ThreeInstitutionNet"),
        date("Date"),
    ],
    write_mode: WriteMode::Append,
};

const MARGIN_SHORT_SALE: CanonicalSchema = CanonicalSchema {
    kind: DataKind::MarginShortSale,
    table: "taiwan_margin_short_sale",
    fields: &[
        text("StockID"),
        text("StockName"),
        int("MarginPurchaseBuy"),
        int("MarginPurchaseSell"),
        int("MarginPurchaseCashRepayment"),
        int("MarginPurchaseYesterdayBalance"),
        int("MarginPurchaseTodayBalance"),
        int("MarginPurchaseLimit"),
        int("ShortSaleBuy"),
        int("ShortSaleSell"),
        int("ShortSaleCashRepayment"),
        int("ShortSaleYesterdayBalance"),
        int("ShortSaleTodayBalance"),
        int("ShortSaleLimit"),
        int("OffsetLoanAndShort"),
        text("Note"),
        date("Date"),
    ],
    write_mode: WriteMode::Append,
};

const TDCC_SHAREHOLDING: CanonicalSchema = CanonicalSchema {
    kind: DataKind::TdccShareholding,
    table: "taiwan_share_holding",
    fields: &[
        date("Date"),
        text("StockID"),
        int("ShareholdingLevel"),
        int("NumberOfHolders"),
        int("NumberOfShares"),
        float("PercentageOfTotalShares"),
    ],
    write_mode: WriteMode::Append,
};

pub fn canonical_schema(kind: DataKind) -> &'static CanonicalSchema {
    match kind {
        DataKind::StockPrice => &STOCK_PRICE,
        DataKind::FuturesDaily => &FUTURES_DAILY,
        DataKind::StockInfo => &STOCK_INFO,
        DataKind::InstitutionalInvestor => &INSTITUTIONAL_INVESTOR,
        DataKind::MarginShortSale => &MARGIN_SHORT_SALE,
        DataKind::TdccShareholding => &TDCC_SHAREHOLDING,
    }
}

/// A typed cell of a validated row.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    fn into_duck(self) -> DuckValue {
        match self {
            Self::Text(value) => DuckValue::Text(value),
            Self::Integer(value) => DuckValue::BigInt(value),
            Self::Float(value) => DuckValue::Double(value),
        }
    }
}

/// Rows that passed validation, in canonical field order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTable {
    pub kind: DataKind,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<FieldValue>>,
}

impl ValidatedTable {
    pub fn empty(kind: DataKind) -> Self {
        Self {
            kind,
            columns: canonical_schema(kind).field_names(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&FieldValue> {
        let index = self.columns.iter().position(|name| *name == column)?;
        self.rows.get(row)?.get(index)
    }

    /// Move the rows out as a storage batch over this table's columns.
    pub fn take_batch(&mut self) -> TableBatch<'_> {
        let rows = std::mem::take(&mut self.rows)
            .into_iter()
            .map(|row| row.into_iter().map(FieldValue::into_duck).collect())
            .collect();
        TableBatch {
            table: canonical_schema(self.kind).table,
            columns: &self.columns,
            rows,
        }
    }
}

/// Validate a normalized table, returning the empty table on any violation.
///
/// The violation is logged; callers only see that nothing survived.
pub fn validate(table: &Table, kind: DataKind) -> ValidatedTable {
    match try_validate(table, kind) {
        Ok(validated) => validated,
        Err(violation) => {
            warn!(
                kind = kind.as_str(),
                rows = table.len(),
                row = violation.row,
                field = violation.field,
                reason = %violation.reason,
                "schema validation failed; discarding batch"
            );
            ValidatedTable::empty(kind)
        }
    }
}

/// Validate a normalized table, reporting the first violation.
///
/// Columns outside the canonical schema are ignored.
pub fn try_validate(table: &Table, kind: DataKind) -> Result<ValidatedTable, SchemaViolation> {
    let schema = canonical_schema(kind);
    if table.is_empty() {
        return Ok(ValidatedTable::empty(kind));
    }

    let mut indices = Vec::with_capacity(schema.fields.len());
    for field in schema.fields {
        let index = table.column_index(field.name).ok_or_else(|| SchemaViolation {
            row: 0,
            field: field.name,
            reason: String::from("is missing"),
        })?;
        indices.push(index);
    }

    let mut rows = Vec::with_capacity(table.len());
    for (row_index, cells) in table.rows.iter().enumerate() {
        let mut values = Vec::with_capacity(schema.fields.len());
        for (field, index) in schema.fields.iter().zip(&indices) {
            let raw = cells.get(*index).ok_or_else(|| SchemaViolation {
                row: row_index,
                field: field.name,
                reason: String::from("is missing"),
            })?;
            let value = coerce(raw, field.ty).map_err(|reason| SchemaViolation {
                row: row_index,
                field: field.name,
                reason,
            })?;
            values.push(value);
        }
        rows.push(values);
    }

    Ok(ValidatedTable {
        kind,
        columns: schema.field_names(),
        rows,
    })
}

fn coerce(raw: &str, ty: FieldType) -> Result<FieldValue, String> {
    let trimmed = raw.trim();
    match ty {
        FieldType::Text => Ok(FieldValue::Text(trimmed.to_string())),
        FieldType::Integer => parse_integer(trimmed)
            .map(FieldValue::Integer)
            .ok_or_else(|| format!("is not an integer: '{raw}'")),
        FieldType::Float => match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(FieldValue::Float(value)),
            _ => Err(format!("is not a number: '{raw}'")),
        },
        FieldType::Date => parse_iso(trimmed)
            .map(|_| FieldValue::Text(trimmed.to_string()))
            .map_err(|_| format!("is not an ISO date: '{raw}'")),
    }
}

/// Integers may arrive as whole floats (`"12.0"`) from CSV sources.
fn parse_integer(value: &str) -> Option<i64> {
    if let Ok(parsed) = value.parse::<i64>() {
        return Some(parsed);
    }
    let parsed = value.parse::<f64>().ok()?;
    if parsed.is_finite() && parsed.fract() == 0.0 && parsed.abs() < 9.0e15 {
        Some(parsed as i64)
    } else {
        None
    }
}
