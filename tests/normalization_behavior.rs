//! Behavior-driven tests for cleaning raw source payloads
//!
//! Each test feeds a realistic payload through decoding, field mapping,
//! cleaning and validation, and checks the values that would be stored.

use serde_json::json;
use twstock_core::sources::parse_response;
use twstock_core::{
    canonical_schema, field_mapping, iso_to_roc, map, normalize, roc_to_iso, try_validate,
    DataKind, FetchOutcome, FetchUnit, HttpResponse, ValidatedTable, Venue,
};

fn clean(kind: DataKind, venue: Venue, unit: FetchUnit, body: &str) -> ValidatedTable {
    let outcome = parse_response(kind, venue, &HttpResponse::ok(body)).expect("decode");
    let FetchOutcome::Rows(raw) = outcome else {
        panic!("expected rows for {kind} from {venue}");
    };
    let mapping = field_mapping(kind, venue).expect("mapping");
    let mapped = map(&raw, &mapping.strategy).expect("shape");
    let cleaned = normalize(kind, venue, &unit, mapped);
    try_validate(&cleaned, kind).expect("valid")
}

fn day(date: &str) -> FetchUnit {
    FetchUnit::Date(date.to_string())
}

fn int(table: &ValidatedTable, row: usize, column: &str) -> i64 {
    table
        .value(row, column)
        .and_then(|value| value.as_i64())
        .unwrap_or_else(|| panic!("{column} is not an integer"))
}

fn float(table: &ValidatedTable, row: usize, column: &str) -> f64 {
    table
        .value(row, column)
        .and_then(|value| value.as_f64())
        .unwrap_or_else(|| panic!("{column} is not a number"))
}

fn text<'a>(table: &'a ValidatedTable, row: usize, column: &str) -> &'a str {
    table
        .value(row, column)
        .and_then(|value| value.as_str())
        .unwrap_or_else(|| panic!("{column} is not text"))
}

fn assert_canonical_columns(table: &ValidatedTable, kind: DataKind) {
    assert_eq!(table.columns, canonical_schema(kind).field_names());
}

fn assert_ints(table: &ValidatedTable, row: usize, expected: &[(&str, i64)]) {
    for (column, value) in expected {
        assert_eq!(int(table, row, column), *value, "{column}");
    }
}

// =============================================================================
// Futures
// =============================================================================

#[test]
fn when_futures_rows_carry_sessions_then_they_map_to_position_and_after_market() {
    // Given: one regular-session and one after-hours row
    let body = "交易日期,契約,到期月份(週別),開盤價,最高價,最低價,收盤價,漲跌價,漲跌%,成交量,結算價,未沖銷契約數,最後最佳買價,最後最佳賣價,歷史最高價,歷史最低價,是否因訊息面暫停交易,交易時段,價差對單式委託成交量\n\
2024/01/05,TX,202401     ,17520,17600,17480,17560,-8,-0.05%,80000,17561,90000,17559,17560,18000,12000,,一般,-\n\
2024/01/05,TX,202401     ,17565,17590,17540,17550,-10,-0.06%,30000,-,-,17549,17550,18000,12000,,盤後,-\n";

    // When
    let table = clean(DataKind::FuturesDaily, Venue::Taifex, day("2024-01-05"), body);

    // Then
    assert_eq!(table.len(), 2);
    assert_eq!(text(&table, 0, "TradingSession"), "Position");
    assert_eq!(text(&table, 1, "TradingSession"), "AfterMarket");
    assert_eq!(text(&table, 0, "ContractDate"), "202401");
    assert_eq!(text(&table, 0, "Date"), "2024-01-05");
    assert!((float(&table, 0, "ChangePer") + 0.05).abs() < 1e-9);
    // After-hours rows have no settlement yet
    assert_eq!(float(&table, 1, "SettlementPrice"), 0.0);
    assert_eq!(int(&table, 1, "OpenInterest"), 0);
}

// =============================================================================
// Depository distribution
// =============================================================================

#[test]
fn when_the_distribution_is_cleaned_then_dates_are_iso_and_ids_lose_leading_zeros() {
    // Given
    let body = "\u{feff}資料日期,證券代號,持股分級,人數,股數,占集保庫存數比例%\n\
20240105,0050,1,123456,45678901,1.23\n\
20240105,2330,17,1,1000000,0.00\n";

    // When
    let table = clean(DataKind::TdccShareholding, Venue::Tdcc, FetchUnit::Latest, body);

    // Then
    assert_eq!(text(&table, 0, "Date"), "2024-01-05");
    assert_eq!(text(&table, 0, "StockID"), "50");
    assert_eq!(text(&table, 1, "StockID"), "2330");
    assert_eq!(int(&table, 1, "ShareholdingLevel"), 17);
    assert!((float(&table, 0, "PercentageOfTotalShares") - 1.23).abs() < 1e-9);
}

// =============================================================================
// Security listings
// =============================================================================

#[test]
fn when_the_listing_page_is_cleaned_then_only_numeric_securities_remain() {
    // Given: a section row, a warrant-like non-numeric code and a blank industry
    let page = r#"<html><body><table>
<tr><td>有價證券代號及名稱</td><td>國際證券辨識號碼(ISIN Code)</td><td>上市日</td><td>市場別</td><td>產業別</td><td>CFICode</td><td>備註</td></tr>
<tr><td colspan="7"><b> 股票 </b></td></tr>
<tr><td>1101　台泥</td><td>TW0001101004</td><td>1962/02/09</td><td>上櫃</td><td>水泥工業</td><td>ESVUFR</td><td></td></tr>
<tr><td>00679B　元大美債20年</td><td>TW00000679B0</td><td>2017/01/17</td><td>上櫃</td><td></td><td>CEOJLU</td><td></td></tr>
<tr><td>6488　環球晶</td><td>TW0006488000</td><td>2015/09/25</td><td>上櫃</td><td></td><td>ESVUFR</td><td></td></tr>
</table></body></html>"#;

    // When
    let table = clean(DataKind::StockInfo, Venue::Tpex, FetchUnit::Latest, page);

    // Then
    assert_eq!(table.len(), 2);
    assert_eq!(text(&table, 0, "StockID"), "1101");
    assert_eq!(text(&table, 0, "StockName"), "台泥");
    assert_eq!(text(&table, 0, "MarketType"), "tpex");
    assert_eq!(text(&table, 1, "IndustryType"), "未知");
}

// =============================================================================
// Margin and institutional flows
// =============================================================================

#[test]
fn when_margin_cells_hold_placeholders_then_they_become_zero() {
    // Given: the second table of the TWSE margin report holds per-stock rows
    let body = json!({
        "stat": "OK",
        "tables": [
            { "title": "信用交易統計", "data": [["融資(交易單位)", "1", "2"]] },
            { "title": "融資融券彙總", "data": [[
                "2330", "台積電", "1,234", "567", "8", "10,000", "10,659", "250,000",
                "12", "--", "0", "300", "312", "250,000", "除權息", " "
            ]] }
        ]
    })
    .to_string();

    // When
    let table = clean(DataKind::MarginShortSale, Venue::Twse, day("2024-01-05"), &body);

    // Then
    assert_eq!(int(&table, 0, "MarginPurchaseBuy"), 1234);
    assert_eq!(int(&table, 0, "ShortSaleSell"), 0);
    assert_eq!(int(&table, 0, "OffsetLoanAndShort"), 0);
    assert_eq!(text(&table, 0, "Note"), "");
    assert_eq!(text(&table, 0, "Date"), "2024-01-05");
}

#[test]
fn when_tpex_margin_is_read_by_label_then_extra_columns_drop_and_placeholders_are_zero() {
    // Given: the OTC report interleaves unmapped columns between the mapped ones
    let body = json!({
        "tables": [{
            "fields": [
                "代號", "名稱", "前資餘額(張)", "資買", "資賣", "現償", "資餘額", "資屬證金",
                "資使用率(%)", "資限額", "前券餘額(張)", "券賣", "券買", "券償", "券餘額",
                "券屬證金", "券使用率(%)", "券限額", "資券相抵(張)", "備註"
            ],
            "data": [[
                "6488", "環球晶", "1,500", "210", "120", "3", "1,587", "0", "1.27",
                "125,000", "40", "15", "12", "--", "43", "0", "0.03", "125,000", "2",
                " 停止融券 "
            ]]
        }]
    })
    .to_string();

    // When
    let table = clean(DataKind::MarginShortSale, Venue::Tpex, day("2024-01-05"), &body);

    // Then
    assert_canonical_columns(&table, DataKind::MarginShortSale);
    assert_eq!(text(&table, 0, "StockID"), "6488");
    assert_eq!(text(&table, 0, "StockName"), "環球晶");
    assert_ints(
        &table,
        0,
        &[
            ("MarginPurchaseBuy", 210),
            ("MarginPurchaseSell", 120),
            ("MarginPurchaseCashRepayment", 3),
            ("MarginPurchaseYesterdayBalance", 1_500),
            ("MarginPurchaseTodayBalance", 1_587),
            ("MarginPurchaseLimit", 125_000),
            ("ShortSaleBuy", 12),
            ("ShortSaleSell", 15),
            ("ShortSaleCashRepayment", 0),
            ("ShortSaleYesterdayBalance", 40),
            ("ShortSaleTodayBalance", 43),
            ("ShortSaleLimit", 125_000),
            ("OffsetLoanAndShort", 2),
        ],
    );
    assert_eq!(text(&table, 0, "Note"), "停止融券");
    assert_eq!(text(&table, 0, "Date"), "2024-01-05");
}

#[test]
fn when_twse_institutional_flows_are_read_by_label_then_the_dealer_total_is_dropped() {
    // Given: the T86 layout, where the dealer total sits between trust and dealer detail
    let body = json!({
        "stat": "OK",
        "fields": [
            "證券代號", "證券名稱", "外陸資買進股數(不含外資自營商)",
            "外陸資賣出股數(不含外資自營商)", "外陸資買賣超股數(不含外資自營商)",
            "外資自營商買進股數", "外資自營商賣出股數", "外資自營商買賣超股數",
            "投信買進股數", "投信賣出股數", "投信買賣超股數", "自營商買賣超股數",
            "自營商買進股數(自行買賣)", "自營商賣出股數(自行買賣)",
            "自營商買賣超股數(自行買賣)", "自營商買進股數(避險)", "自營商賣出股數(避險)",
            "自營商買賣超股數(避險)", "三大法人買賣超股數"
        ],
        "data": [[
            "2330  ", "台積電", "21,000,000", "18,500,000", "2,500,000", "--", "0", "0",
            "310,000", "120,000", "190,000", "-77,000", "41,000", "52,000", "-11,000",
            "130,000", "196,000", "-66,000", "2,613,000"
        ]]
    })
    .to_string();

    // When
    let table = clean(DataKind::InstitutionalInvestor, Venue::Twse, day("2024-01-05"), &body);

    // Then
    assert_canonical_columns(&table, DataKind::InstitutionalInvestor);
    assert!(table.value(0, "DealerNet").is_none());
    assert_eq!(text(&table, 0, "StockID"), "2330");
    assert_eq!(text(&table, 0, "StockName"), "台積電");
    assert_ints(
        &table,
        0,
        &[
            ("ForeignBuy", 21_000_000),
            ("ForeignSell", 18_500_000),
            ("ForeignNet", 2_500_000),
            ("ForeignDealerBuy", 0),
            ("ForeignDealerSell", 0),
            ("ForeignDealerNet", 0),
            ("InvestmentTrustBuy", 310_000),
            ("InvestmentTrustSell", 120_000),
            ("InvestmentTrustNet", 190_000),
            ("DealerSelfBuy", 41_000),
            ("DealerSelfSell", 52_000),
            ("DealerSelfNet", -11_000),
            ("DealerHedgeBuy", 130_000),
            ("DealerHedgeSell", 196_000),
            ("DealerHedgeNet", -66_000),
            ("ThreeInstitutionNet", 2_613_000),
        ],
    );
    assert_eq!(text(&table, 0, "Date"), "2024-01-05");
}

#[test]
fn when_tpex_institutional_flows_are_read_by_position_then_subtotals_are_skipped() {
    // Given: 24 cells; the foreign total (8-10) and dealer total (20-22) are not stored
    let body = json!({
        "tables": [{
            "data": [[
                "6488", "環球晶", "1,200,000", "900,000", "300,000", "5,000", "---", "5,000",
                "1,205,000", "900,000", "305,000", "80,000", "20,000", "60,000",
                "7,000", "9,000", "-2,000", "3,000", "1,000", "2,000",
                "10,000", "10,000", "0", "367,000"
            ]]
        }]
    })
    .to_string();

    // When
    let table = clean(DataKind::InstitutionalInvestor, Venue::Tpex, day("2024-01-05"), &body);

    // Then
    assert_canonical_columns(&table, DataKind::InstitutionalInvestor);
    assert_eq!(text(&table, 0, "StockID"), "6488");
    assert_eq!(text(&table, 0, "StockName"), "環球晶");
    assert_ints(
        &table,
        0,
        &[
            ("ForeignBuy", 1_200_000),
            ("ForeignSell", 900_000),
            ("ForeignNet", 300_000),
            ("ForeignDealerBuy", 5_000),
            ("ForeignDealerSell", 0),
            ("ForeignDealerNet", 5_000),
            ("InvestmentTrustBuy", 80_000),
            ("InvestmentTrustSell", 20_000),
            ("InvestmentTrustNet", 60_000),
            ("DealerSelfBuy", 7_000),
            ("DealerSelfSell", 9_000),
            ("DealerSelfNet", -2_000),
            ("DealerHedgeBuy", 3_000),
            ("DealerHedgeSell", 1_000),
            ("DealerHedgeNet", 2_000),
            ("ThreeInstitutionNet", 367_000),
        ],
    );
}

#[test]
fn when_the_price_direction_is_minus_then_the_change_is_negative() {
    // Given
    let body = json!({
        "stat": "OK",
        "fields9": [
            "證券代號", "證券名稱", "成交股數", "成交筆數", "成交金額", "開盤價", "最高價",
            "最低價", "收盤價", "漲跌(+/-)", "漲跌價差", "最後揭示買價", "最後揭示買量",
            "最後揭示賣價", "最後揭示賣量", "本益比"
        ],
        "data9": [
            ["2330", "台積電", "25,000,000", "30,000", "14,800,000,000", "590.00", "595.00",
             "588.00", "593.00", "<p style= color:green>-</p>", "3.00", "592.00", "100",
             "593.00", "50", "15.20"],
            ["2317", "鴻海", "40,000,000", "20,000", "4,200,000,000", "104.00", "105.50",
             "103.50", "105.00", "<p style= color:red>+</p>", "1.00", "104.50", "10",
             "105.00", "20", "12.10"],
            ["1101", "台泥", "0", "0", "0", "--", "--", "--", "--", " ", "0.00", "--", "0",
             "--", "0", "0.00"]
        ]
    })
    .to_string();

    // When
    let table = clean(DataKind::StockPrice, Venue::Twse, day("2024-01-05"), &body);

    // Then
    assert_eq!(float(&table, 0, "Change"), -3.0);
    assert_eq!(float(&table, 1, "Change"), 1.0);
    assert_eq!(float(&table, 2, "Close"), 0.0);
    assert_eq!(int(&table, 1, "TradeVolume"), 40_000_000);
}

// =============================================================================
// Calendar
// =============================================================================

#[test]
fn when_dates_cross_between_calendars_then_they_round_trip() {
    assert_eq!(iso_to_roc("2024-01-05").expect("roc"), "113/01/05");
    assert_eq!(roc_to_iso("113/01/05").expect("iso"), "2024-01-05");
    assert_eq!(roc_to_iso("1/01/01").expect("iso"), "1912-01-01");
    assert!(roc_to_iso("113/02/30").is_err());
    assert!(iso_to_roc("1911-12-31").is_err());
}
