/// Storage-side description of a destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    /// Columns of the primary key, in key order.
    pub key_columns: &'static [&'static str],
    /// Columns rewritten when an upsert hits an existing key.
    pub mutable_columns: &'static [&'static str],
    /// Identifier column used by lookups.
    pub id_column: &'static str,
    /// Date column used by lookups, if the table is date-stamped.
    pub date_column: Option<&'static str>,
}

pub const TAIWAN_STOCK_PRICE: TableDef = TableDef {
    name: "taiwan_stock_price",
    key_columns: &["StockID", "Date"],
    mutable_columns: &[],
    id_column: "StockID",
    date_column: Some("Date"),
};

pub const TAIWAN_FUTURE_DAILY: TableDef = TableDef {
    name: "taiwan_future_daily",
    key_columns: &["FuturesID", "ContractDate", "Date", "TradingSession"],
    mutable_columns: &[],
    id_column: "FuturesID",
    date_column: Some("Date"),
};

pub const TAIWAN_STOCK_INFO: TableDef = TableDef {
    name: "taiwan_stock_info",
    key_columns: &["StockID"],
    mutable_columns: &["StockName", "MarketType"],
    id_column: "StockID",
    date_column: None,
};

pub const TAIWAN_INSTITUTIONAL_INVESTOR: TableDef = TableDef {
    name: "taiwan_institutional_investor",
    key_columns: &["StockID", "Date"],
    mutable_columns: &[],
    id_column: "StockID",
    date_column: Some("Date"),
};

pub const TAIWAN_MARGIN_SHORT_SALE: TableDef = TableDef {
    name: "taiwan_margin_short_sale",
    key_columns: &["StockID", "Date"],
    mutable_columns: &[],
    id_column: "StockID",
    date_column: Some("Date"),
};

pub const TAIWAN_SHARE_HOLDING: TableDef = TableDef {
    name: "taiwan_share_holding",
    key_columns: &["StockID", "Date", "ShareholdingLevel"],
    mutable_columns: &[],
    id_column: "StockID",
    date_column: Some("Date"),
};

pub const TABLES: &[TableDef] = &[
    TAIWAN_STOCK_PRICE,
    TAIWAN_FUTURE_DAILY,
    TAIWAN_STOCK_INFO,
    TAIWAN_INSTITUTIONAL_INVESTOR,
    TAIWAN_MARGIN_SHORT_SALE,
    TAIWAN_SHARE_HOLDING,
];

/// Look up a destination table by name.
pub fn table_def(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().find(|table| table.name == name)
}
