//! Behavior-driven tests for task runs
//!
//! These tests drive named tasks end to end against scripted exchange
//! responses and a throwaway warehouse, checking what lands on disk and
//! which requests went out.

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use twstock_core::{
    run_daily, run_task, HttpResponse, Pipeline, PipelineConfig, RunError, ScriptedHttpClient,
    SourceClient, TaskError, UnitStatus, Warehouse, DEFAULT_MAX_ROWS,
};
use twstock_tests::{open_warehouse, row_objects};
use twstock_warehouse::{ConnectionRouter, DuckDbConnectionFactory};

type TestPipeline = Pipeline<ConnectionRouter<DuckDbConnectionFactory>>;

struct Harness {
    _dir: TempDir,
    warehouse: Warehouse,
    http: Arc<ScriptedHttpClient>,
}

impl Harness {
    fn new(http: ScriptedHttpClient) -> Self {
        let (dir, warehouse) = open_warehouse();
        Self {
            _dir: dir,
            warehouse,
            http: Arc::new(http),
        }
    }

    fn pipeline(&self) -> TestPipeline {
        let config = PipelineConfig::without_delays();
        let router = self.warehouse.router(config.router_config());
        Pipeline::new(SourceClient::new(self.http.clone(), config), router)
    }

    fn rows(&self, table: &str, id: &str) -> Vec<Value> {
        let result = self
            .warehouse
            .lookup(table, id, None, None, DEFAULT_MAX_ROWS)
            .expect("lookup");
        row_objects(result)
    }
}

fn twse_price_body(stock_id: &str, volume: &str) -> String {
    json!({
        "stat": "OK",
        "fields9": [
            "證券代號", "證券名稱", "成交股數", "成交筆數", "成交金額", "開盤價", "最高價",
            "最低價", "收盤價", "漲跌(+/-)", "漲跌價差", "最後揭示買價", "最後揭示買量",
            "最後揭示賣價", "最後揭示賣量", "本益比"
        ],
        "data9": [[
            stock_id, "台積電", volume, "30,000", "14,800,000,000", "590.00", "595.00",
            "588.00", "593.00", "<p style= color:green>-</p>", "3.00", "592.00", "100",
            "593.00", "50", "15.20"
        ]]
    })
    .to_string()
}

fn tpex_price_body(volume: &str) -> String {
    json!({
        "tables": [{
            "data": [["6488", "環球晶", "450.00", "+5.00", "446.00", "452.00", "445.00",
                      volume, "551,000,000", "1,200"]]
        }]
    })
    .to_string()
}

fn no_data_body() -> String {
    json!({ "stat": "很抱歉，沒有符合條件的資料!" }).to_string()
}

// =============================================================================
// Task dispatch
// =============================================================================

#[tokio::test]
async fn when_a_week_is_requested_then_only_business_days_are_fetched() {
    // Given: 2024-01-04 (Thu) through 2024-01-10 (Wed) spans one weekend
    let mut http = ScriptedHttpClient::new();
    for _ in 0..5 {
        http = http
            .respond("MI_INDEX", HttpResponse::ok(no_data_body()))
            .respond("stk_wn1430", HttpResponse::ok(json!({ "tables": [] }).to_string()));
    }
    let harness = Harness::new(http);
    let mut pipeline = harness.pipeline();

    // When
    let report = run_task(&mut pipeline, "stock-price", Some("2024-01-04"), Some("2024-01-10"))
        .await
        .expect("run");
    drop(pipeline);

    // Then: five dates, one request per venue each, no weekend dates
    let requests = harness.http.requests();
    assert_eq!(requests.len(), 10);
    let twse_urls = requests
        .iter()
        .filter(|request| request.url.contains("MI_INDEX"))
        .map(|request| request.url.clone())
        .collect::<Vec<_>>();
    assert_eq!(twse_urls.len(), 5);
    assert!(twse_urls.iter().all(|url| !url.contains("20240106") && !url.contains("20240107")));
    assert_eq!(report.units.len(), 10);
    assert_eq!(report.rows_written, 0);
}

#[tokio::test]
async fn when_the_exchange_has_no_data_then_nothing_is_written() {
    // Given
    let http = ScriptedHttpClient::new()
        .respond("MI_INDEX", HttpResponse::ok(no_data_body()))
        .respond("stk_wn1430", HttpResponse::ok(tpex_price_body("1,000")));
    let harness = Harness::new(http);
    let mut pipeline = harness.pipeline();

    // When
    let report = run_task(&mut pipeline, "stock-price", Some("2024-01-05"), Some("2024-01-05"))
        .await
        .expect("run");
    drop(pipeline);

    // Then: the TWSE unit is empty, the TPEX unit still lands
    assert!(matches!(report.units[0].status, UnitStatus::Empty { .. }));
    assert_eq!(report.units[1].status, UnitStatus::Written { rows: 1 });
    assert!(harness.rows("taiwan_stock_price", "2330").is_empty());
    assert_eq!(harness.rows("taiwan_stock_price", "6488").len(), 1);
}

#[tokio::test]
async fn when_both_venues_publish_then_each_is_written_once() {
    // Given
    let http = ScriptedHttpClient::new()
        .respond("MI_INDEX", HttpResponse::ok(twse_price_body("2330", "25,000,000")))
        .respond("stk_wn1430", HttpResponse::ok(tpex_price_body("1,234,000")));
    let harness = Harness::new(http);
    let mut pipeline = harness.pipeline();

    // When
    let report = run_task(&mut pipeline, "stock-price", Some("2024-01-05"), Some("2024-01-05"))
        .await
        .expect("run");
    drop(pipeline);

    // Then
    assert_eq!(report.rows_written, 2);
    let twse = harness.rows("taiwan_stock_price", "2330");
    assert_eq!(twse.len(), 1);
    assert_eq!(twse[0]["TradeVolume"], 25_000_000);
    assert_eq!(twse[0]["Date"], "2024-01-05");
    assert_eq!(twse[0]["Change"], -3.0);
    let tpex = harness.rows("taiwan_stock_price", "6488");
    assert_eq!(tpex[0]["Change"], 5.0);
}

#[tokio::test]
async fn when_volume_is_a_placeholder_then_zero_is_stored() {
    // Given
    let http = ScriptedHttpClient::new()
        .respond("MI_INDEX", HttpResponse::ok(twse_price_body("2330", "--")))
        .respond("stk_wn1430", HttpResponse::ok(tpex_price_body("---")));
    let harness = Harness::new(http);
    let mut pipeline = harness.pipeline();

    // When
    run_task(&mut pipeline, "stock-price", Some("2024-01-05"), Some("2024-01-05"))
        .await
        .expect("run");
    drop(pipeline);

    // Then
    assert_eq!(harness.rows("taiwan_stock_price", "2330")[0]["TradeVolume"], 0);
    assert_eq!(harness.rows("taiwan_stock_price", "6488")[0]["TradeVolume"], 0);
}

#[tokio::test]
async fn when_one_row_of_five_hundred_is_bad_then_the_batch_is_dropped() {
    // Given: row 250 carries a volume that is not a number
    let data = (0..500)
        .map(|index| {
            let volume = if index == 250 { "n/a".to_string() } else { "1,000".to_string() };
            json!([format!("{}", 8000 + index), "測試", "10.00", "0.00", "10.00", "10.00",
                   "10.00", volume, "10,000", "10"])
        })
        .collect::<Vec<_>>();
    let body = json!({ "tables": [{ "data": data }] }).to_string();
    let http = ScriptedHttpClient::new()
        .respond("MI_INDEX", HttpResponse::ok(no_data_body()))
        .respond("stk_wn1430", HttpResponse::ok(body));
    let harness = Harness::new(http);
    let mut pipeline = harness.pipeline();

    // When
    let report = run_task(&mut pipeline, "stock-price", Some("2024-01-05"), Some("2024-01-05"))
        .await
        .expect("run");
    drop(pipeline);

    // Then
    assert_eq!(report.units[1].status, UnitStatus::Discarded { rows: 500 });
    assert!(harness.rows("taiwan_stock_price", "8000").is_empty());
}

#[tokio::test]
async fn when_a_venue_is_unreachable_then_the_run_moves_on() {
    // Given
    let http = ScriptedHttpClient::new()
        .fail("MI_INDEX", "connection reset")
        .respond("stk_wn1430", HttpResponse::ok(tpex_price_body("1,000")));
    let harness = Harness::new(http);
    let mut pipeline = harness.pipeline();

    // When
    let report = run_task(&mut pipeline, "stock-price", Some("2024-01-05"), Some("2024-01-05"))
        .await
        .expect("run");
    drop(pipeline);

    // Then
    assert!(matches!(
        report.units[0].status,
        UnitStatus::SourceFailed { code: "fetch_error", .. }
    ));
    assert_eq!(report.rows_written, 1);
}

#[tokio::test]
async fn when_stock_info_is_refreshed_then_names_are_updated_in_place() {
    // Given: two snapshots where 2330 changes its name
    let page = |name: &str| {
        format!(
            r#"<table>
<tr><td>有價證券代號及名稱</td><td>國際證券辨識號碼(ISIN Code)</td><td>上市日</td><td>市場別</td><td>產業別</td><td>CFICode</td><td>備註</td></tr>
<tr><td colspan="7">股票</td></tr>
<tr><td>2330　{name}</td><td>TW0002330008</td><td>1994/09/05</td><td>上市</td><td>半導體業</td><td>ESVUFR</td><td></td></tr>
</table>"#
        )
    };
    let empty_board = "<table><tr><td>有價證券代號及名稱</td><td>市場別</td><td>產業別</td></tr></table>";
    let http = ScriptedHttpClient::new()
        .respond("strMode=2", HttpResponse::ok(page("台積電")))
        .respond("strMode=4", HttpResponse::ok(empty_board))
        .respond("strMode=2", HttpResponse::ok(page("台灣積體電路")))
        .respond("strMode=4", HttpResponse::ok(empty_board));
    let harness = Harness::new(http);
    let mut pipeline = harness.pipeline();

    // When
    run_task(&mut pipeline, "stock-info", None, None).await.expect("first run");
    run_task(&mut pipeline, "stock-info", None, None).await.expect("second run");
    drop(pipeline);

    // Then
    let rows = harness.rows("taiwan_stock_info", "2330");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["StockName"], "台灣積體電路");
    assert_eq!(rows[0]["IndustryType"], "半導體業");
}

#[tokio::test]
async fn when_the_task_name_is_unknown_then_no_request_is_sent() {
    let harness = Harness::new(ScriptedHttpClient::new());
    let mut pipeline = harness.pipeline();

    let error = run_task(&mut pipeline, "stock-dividend", None, None)
        .await
        .expect_err("unknown task");

    assert!(matches!(error, RunError::Task(TaskError::UnknownTask { .. })));
    assert!(harness.http.requests().is_empty());
}

#[tokio::test]
async fn when_a_dated_task_has_no_range_then_no_request_is_sent() {
    let harness = Harness::new(ScriptedHttpClient::new());
    let mut pipeline = harness.pipeline();

    let error = run_task(&mut pipeline, "institutional-investor", Some("2024-01-05"), None)
        .await
        .expect_err("missing range");

    assert!(matches!(
        error,
        RunError::Task(TaskError::MissingDateRange { .. })
    ));
    assert!(harness.http.requests().is_empty());
}

#[tokio::test]
async fn when_the_daily_date_is_a_weekend_then_only_snapshots_are_fetched() {
    // Given: 2024-01-06 is a Saturday
    let http = ScriptedHttpClient::new()
        .respond("strMode=2", HttpResponse::ok("<table><tr><td>x</td></tr></table>"))
        .respond("strMode=4", HttpResponse::ok("<table><tr><td>x</td></tr></table>"))
        .respond("getOD.ashx", HttpResponse::ok("資料日期,證券代號,持股分級,人數,股數,占集保庫存數比例%\n"));
    let harness = Harness::new(http);
    let mut pipeline = harness.pipeline();

    // When
    let report = run_daily(&mut pipeline, "2024-01-06").await.expect("daily");
    drop(pipeline);

    // Then: reference data still refreshes, dated kinds send nothing
    assert_eq!(report.tasks.len(), 6);
    assert_eq!(harness.http.requests().len(), 3);
    assert_eq!(report.rows_written, 0);
}
