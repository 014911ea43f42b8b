//! Source column layouts and their canonical field names.
//!
//! Every (kind, venue) pair has exactly one [`FieldMapping`]. The tables are
//! data: the source labels are the exchanges' own headers, and a target of
//! `""` marks a source column that is deliberately discarded.

use thiserror::Error;

use crate::domain::{DataKind, Venue};
use crate::table::Table;

/// How source cells are located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingStrategy {
    /// Header label to canonical name. Unlisted labels and `""` targets drop.
    ByName(&'static [(&'static str, &'static str)]),
    /// Zero-based cell position to canonical name. Unlisted positions drop.
    ByPosition(&'static [(usize, &'static str)]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub kind: DataKind,
    pub venue: Venue,
    pub strategy: MappingStrategy,
}

/// A raw row too short for its layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("row {row} has {len} cells, layout needs {needed}")]
pub struct ShapeError {
    pub row: usize,
    pub len: usize,
    pub needed: usize,
}

const TWSE_STOCK_PRICE: &[(&str, &str)] = &[
    ("證券代號", "StockID"),
    ("證券名稱", ""),
    ("成交股數", "TradeVolume"),
    ("成交筆數", "Transaction"),
    ("成交金額", "TradeValue"),
    ("開盤價", "Open"),
    ("最高價", "Max"),
    ("最低價", "Min"),
    ("收盤價", "Close"),
    ("漲跌(+/-)", "Dir"),
    ("漲跌價差", "Change"),
    ("最後揭示買價", ""),
    ("最後揭示買量", ""),
    ("最後揭示賣價", ""),
    ("最後揭示賣量", ""),
    ("本益比", ""),
];

const TPEX_STOCK_PRICE: &[(usize, &str)] = &[
    (0, "StockID"),
    (2, "Close"),
    (3, "Change"),
    (4, "Open"),
    (5, "Max"),
    (6, "Min"),
    (7, "TradeVolume"),
    (8, "TradeValue"),
    (9, "Transaction"),
];

const TWSE_INSTITUTIONAL_INVESTOR: &[(&str, &str)] = &[
    ("證券代號", "StockID"),
    ("證券名稱", "StockName"),
    ("外陸資買進股數(不含外資自營商)", "ForeignBuy"),
    ("外陸資賣出股數(不含外資自營商)", "ForeignSell"),
    ("外陸資買賣超股數(不含外資自營商)", "ForeignNet"),
    ("外資自營商買進股數", "ForeignDealerBuy"),
    ("外資自營商賣出股數", "ForeignDealerSell"),
    ("外資自營商買賣超股數", "ForeignDealerNet"),
    ("投信買進股數", "InvestmentTrustBuy"),
    ("投信賣出股數", "InvestmentTrustSell"),
    ("投信買賣超股數", "InvestmentTrustNet"),
    ("自營商買賣超股數", "DealerNet"),
    ("自營商買進股數(自行買賣)", "DealerSelfBuy"),
    ("自營商賣出股數(自行買賣)", "DealerSelfSell"),
    ("自營商買賣超股數(自行買賣)", "DealerSelfNet"),
    ("自營商買進股數(避險)", "DealerHedgeBuy"),
    ("自營商賣出股數(避險)", "DealerHedgeSell"),
    ("自營商買賣超股數(避險)", "DealerHedgeNet"),
    ("三大法人買賣超股數", "ThreeInstitutionNet"),
];

const TPEX_INSTITUTIONAL_INVESTOR: &[(usize, &str)] = &[
    (0, "StockID"),
    (1, "StockName"),
    (2, "ForeignBuy"),
    (3, "ForeignSell"),
    (4, "ForeignNet"),
    (5, "ForeignDealerBuy"),
    (6, "ForeignDealerSell"),
    (7, "ForeignDealerNet"),
    (11, "InvestmentTrustBuy"),
    (12, "InvestmentTrustSell"),
    (13, "InvestmentTrustNet"),
    (14, "DealerSelfBuy"),
    (15, "DealerSelfSell"),
    (16, "DealerSelfNet"),
    (17, "DealerHedgeBuy"),
    (18, "DealerHedgeSell"),
    (19, "DealerHedgeNet"),
    (23, "ThreeInstitutionNet"),
];

// The TWSE margin table repeats its header labels, so it is read by position.
const TWSE_MARGIN_SHORT_SALE: &[(usize, &str)] = &[
    (0, "StockID"),
    (1, "StockName"),
    (2, "MarginPurchaseBuy"),
    (3, "MarginPurchaseSell"),
    (4, "MarginPurchaseCashRepayment"),
    (5, "MarginPurchaseYesterdayBalance"),
    (6, "MarginPurchaseTodayBalance"),
    (7, "MarginPurchaseLimit"),
    (8, "ShortSaleBuy"),
    (9, "ShortSaleSell"),
    (10, "ShortSaleCashRepayment"),
    (11, "ShortSaleYesterdayBalance"),
    (12, "ShortSaleTodayBalance"),
    (13, "ShortSaleLimit"),
    (14, "OffsetLoanAndShort"),
    (15, "Note"),
];

const TPEX_MARGIN_SHORT_SALE: &[(&str, &str)] = &[
    ("代號", "StockID"),
    ("名稱", "StockName"),
    ("資買", "MarginPurchaseBuy"),
    ("資賣", "MarginPurchaseSell"),
    ("現償", "MarginPurchaseCashRepayment"),
    ("前資餘額(張)", "MarginPurchaseYesterdayBalance"),
    ("資餘額", "MarginPurchaseTodayBalance"),
    ("資限額", "MarginPurchaseLimit"),
    ("券買", "ShortSaleBuy"),
    ("券賣", "ShortSaleSell"),
    ("券償", "ShortSaleCashRepayment"),
    ("前券餘額(張)", "ShortSaleYesterdayBalance"),
    ("券餘額", "ShortSaleTodayBalance"),
    ("券限額", "ShortSaleLimit"),
    ("資券相抵(張)", "OffsetLoanAndShort"),
    ("備註", "Note"),
];

const TAIFEX_FUTURES_DAILY: &[(&str, &str)] = &[
    ("交易日期", "date"),
    ("契約", "FuturesID"),
    ("到期月份(週別)", "ContractDate"),
    ("開盤價", "Open"),
    ("最高價", "Max"),
    ("最低價", "Min"),
    ("收盤價", "Close"),
    ("漲跌價", "Change"),
    ("漲跌%", "ChangePer"),
    ("成交量", "Volume"),
    ("結算價", "SettlementPrice"),
    ("未沖銷契約數", "OpenInterest"),
    ("交易時段", "TradingSession"),
    ("最後最佳買價", ""),
    ("最後最佳賣價", ""),
    ("歷史最高價", ""),
    ("歷史最低價", ""),
    ("是否因訊息面暫停交易", ""),
    ("價差對單式委託成交量", ""),
];

const ISIN_STOCK_INFO: &[(&str, &str)] = &[
    ("有價證券代號及名稱", "StockCodeName"),
    ("市場別", "MarketType"),
    ("產業別", "IndustryType"),
];

const TDCC_SHAREHOLDING: &[(&str, &str)] = &[
    ("資料日期", "Date"),
    ("證券代號", "StockID"),
    ("持股分級", "ShareholdingLevel"),
    ("人數", "NumberOfHolders"),
    ("股數", "NumberOfShares"),
    ("占集保庫存數比例%", "PercentageOfTotalShares"),
];

const MAPPINGS: &[FieldMapping] = &[
    FieldMapping {
        kind: DataKind::StockPrice,
        venue: Venue::Twse,
        strategy: MappingStrategy::ByName(TWSE_STOCK_PRICE),
    },
    FieldMapping {
        kind: DataKind::StockPrice,
        venue: Venue::Tpex,
        strategy: MappingStrategy::ByPosition(TPEX_STOCK_PRICE),
    },
    FieldMapping {
        kind: DataKind::InstitutionalInvestor,
        venue: Venue::Twse,
        strategy: MappingStrategy::ByName(TWSE_INSTITUTIONAL_INVESTOR),
    },
    FieldMapping {
        kind: DataKind::InstitutionalInvestor,
        venue: Venue::Tpex,
        strategy: MappingStrategy::ByPosition(TPEX_INSTITUTIONAL_INVESTOR),
    },
    FieldMapping {
        kind: DataKind::MarginShortSale,
        venue: Venue::Twse,
        strategy: MappingStrategy::ByPosition(TWSE_MARGIN_SHORT_SALE),
    },
    FieldMapping {
        kind: DataKind::MarginShortSale,
        venue: Venue::Tpex,
        strategy: MappingStrategy::ByName(TPEX_MARGIN_SHORT_SALE),
    },
    FieldMapping {
        kind: DataKind::FuturesDaily,
        venue: Venue::Taifex,
        strategy: MappingStrategy::ByName(TAIFEX_FUTURES_DAILY),
    },
    FieldMapping {
        kind: DataKind::StockInfo,
        venue: Venue::Twse,
        strategy: MappingStrategy::ByName(ISIN_STOCK_INFO),
    },
    FieldMapping {
        kind: DataKind::StockInfo,
        venue: Venue::Tpex,
        strategy: MappingStrategy::ByName(ISIN_STOCK_INFO),
    },
    FieldMapping {
        kind: DataKind::TdccShareholding,
        venue: Venue::Tdcc,
        strategy: MappingStrategy::ByName(TDCC_SHAREHOLDING),
    },
];

/// The layout a venue uses for a kind, if it publishes that kind at all.
pub fn field_mapping(kind: DataKind, venue: Venue) -> Option<&'static FieldMapping> {
    MAPPINGS
        .iter()
        .find(|mapping| mapping.kind == kind && mapping.venue == venue)
}

/// Relabel a raw table into canonical columns.
///
/// Output columns follow the order of the mapping table. Source labels are
/// compared after trimming whitespace; the first column carrying a label wins.
pub fn map(raw: &Table, strategy: &MappingStrategy) -> Result<Table, ShapeError> {
    let selected: Vec<(usize, &'static str)> = match strategy {
        MappingStrategy::ByName(pairs) => {
            if let Some((row, cells)) = raw
                .rows
                .iter()
                .enumerate()
                .find(|(_, cells)| cells.len() < raw.columns.len())
            {
                return Err(ShapeError {
                    row,
                    len: cells.len(),
                    needed: raw.columns.len(),
                });
            }
            pairs
                .iter()
                .filter(|(_, target)| !target.is_empty())
                .filter_map(|(source, target)| {
                    raw.columns
                        .iter()
                        .position(|column| column.trim() == *source)
                        .map(|index| (index, *target))
                })
                .collect()
        }
        MappingStrategy::ByPosition(pairs) => {
            let needed = pairs.iter().map(|(index, _)| index + 1).max().unwrap_or(0);
            if let Some((row, cells)) = raw
                .rows
                .iter()
                .enumerate()
                .find(|(_, cells)| cells.len() < needed)
            {
                return Err(ShapeError {
                    row,
                    len: cells.len(),
                    needed,
                });
            }
            pairs.to_vec()
        }
    };

    let columns = selected
        .iter()
        .map(|(_, target)| (*target).to_string())
        .collect();
    let rows = raw
        .rows
        .iter()
        .map(|cells| {
            selected
                .iter()
                .map(|(index, _)| cells[*index].clone())
                .collect()
        })
        .collect();

    Ok(Table::new(columns, rows))
}
