use std::fmt::{Display, Formatter};

use serde::Serialize;

/// One of the six canonical record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    StockPrice,
    FuturesDaily,
    StockInfo,
    InstitutionalInvestor,
    MarginShortSale,
    TdccShareholding,
}

impl DataKind {
    pub const ALL: [DataKind; 6] = [
        Self::StockPrice,
        Self::FuturesDaily,
        Self::StockInfo,
        Self::InstitutionalInvestor,
        Self::MarginShortSale,
        Self::TdccShareholding,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StockPrice => "stock_price",
            Self::FuturesDaily => "futures_daily",
            Self::StockInfo => "stock_info",
            Self::InstitutionalInvestor => "institutional_investor",
            Self::MarginShortSale => "margin_short_sale",
            Self::TdccShareholding => "tdcc_shareholding",
        }
    }

    /// Venues publishing this kind, in fetch order.
    pub const fn venues(self) -> &'static [Venue] {
        match self {
            Self::StockPrice
            | Self::StockInfo
            | Self::InstitutionalInvestor
            | Self::MarginShortSale => &[Venue::Twse, Venue::Tpex],
            Self::FuturesDaily => &[Venue::Taifex],
            Self::TdccShareholding => &[Venue::Tdcc],
        }
    }

    /// Whether each fetch unit is a trading date rather than the latest snapshot.
    pub const fn is_dated(self) -> bool {
        !matches!(self, Self::StockInfo | Self::TdccShareholding)
    }
}

impl Display for DataKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publisher of a raw table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    /// Taiwan Stock Exchange, main board.
    Twse,
    /// Taipei Exchange, OTC board.
    Tpex,
    /// Taiwan Futures Exchange.
    Taifex,
    /// Taiwan Depository & Clearing Corporation.
    Tdcc,
}

impl Venue {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Twse => "twse",
            Self::Tpex => "tpex",
            Self::Taifex => "taifex",
            Self::Tdcc => "tdcc",
        }
    }
}

impl Display for Venue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single request asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "date", rename_all = "snake_case")]
pub enum FetchUnit {
    /// One trading date, ISO-8601.
    Date(String),
    /// The source's current snapshot.
    Latest,
}

impl FetchUnit {
    pub fn date(&self) -> Option<&str> {
        match self {
            Self::Date(date) => Some(date.as_str()),
            Self::Latest => None,
        }
    }
}

impl Display for FetchUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date(date) => f.write_str(date),
            Self::Latest => f.write_str("latest"),
        }
    }
}
