use ::duckdb::Connection;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_market_tables",
        sql: r#"
CREATE TABLE IF NOT EXISTS taiwan_stock_price (
    "StockID" TEXT NOT NULL,
    "TradeVolume" BIGINT NOT NULL,
    "Transaction" BIGINT NOT NULL,
    "TradeValue" BIGINT NOT NULL,
    "Open" DOUBLE NOT NULL,
    "Max" DOUBLE NOT NULL,
    "Min" DOUBLE NOT NULL,
    "Close" DOUBLE NOT NULL,
    "Change" DOUBLE NOT NULL,
    "Date" TEXT NOT NULL,
    PRIMARY KEY("StockID", "Date")
);

CREATE TABLE IF NOT EXISTS taiwan_future_daily (
    "Date" TEXT NOT NULL,
    "FuturesID" TEXT NOT NULL,
    "ContractDate" TEXT NOT NULL,
    "Open" DOUBLE NOT NULL,
    "Max" DOUBLE NOT NULL,
    "Min" DOUBLE NOT NULL,
    "Close" DOUBLE NOT NULL,
    "Change" DOUBLE NOT NULL,
    "ChangePer" DOUBLE NOT NULL,
    "Volume" DOUBLE NOT NULL,
    "SettlementPrice" DOUBLE NOT NULL,
    "OpenInterest" BIGINT NOT NULL,
    "TradingSession" TEXT NOT NULL,
    PRIMARY KEY("FuturesID", "ContractDate", "Date", "TradingSession")
);

CREATE TABLE IF NOT EXISTS taiwan_stock_info (
    "StockID" TEXT PRIMARY KEY,
    "StockName" TEXT NOT NULL,
    "MarketType" TEXT NOT NULL,
    "IndustryType" TEXT NOT NULL
);
"#,
    },
    Migration {
        version: "0002_flow_tables",
        sql: r#"
CREATE TABLE IF NOT EXISTS taiwan_institutional_investor (
    "StockID" TEXT NOT NULL,
    "StockName" TEXT NOT NULL,
    "ForeignBuy" BIGINT NOT NULL,
    "ForeignSell" BIGINT NOT NULL,
    "ForeignNet" BIGINT NOT NULL,
    "ForeignDealerBuy" BIGINT NOT NULL,
    "ForeignDealerSell" BIGINT NOT NULL,
    "ForeignDealerNet" BIGINT NOT NULL,
    "InvestmentTrustBuy" BIGINT NOT NULL,
    "InvestmentTrustSell" BIGINT NOT NULL,
    "InvestmentTrustNet" BIGINT NOT NULL,
    "DealerSelfBuy" BIGINT NOT NULL,
    "DealerSelfSell" BIGINT NOT NULL,
    "DealerSelfNet" BIGINT NOT NULL,
    "DealerHedgeBuy" BIGINT NOT NULL,
    "DealerHedgeSell" BIGINT NOT NULL,
    "DealerHedgeNet" BIGINT NOT NULL,
    "ThreeInstitutionNet" BIGINT NOT NULL,
    "Date" TEXT NOT NULL,
    PRIMARY KEY("StockID", "Date")
);

CREATE TABLE IF NOT EXISTS taiwan_margin_short_sale (
    "StockID" TEXT NOT NULL,
    "StockName" TEXT NOT NULL,
    "MarginPurchaseBuy" BIGINT NOT NULL,
    "MarginPurchaseSell" BIGINT NOT NULL,
    "MarginPurchaseCashRepayment" BIGINT NOT NULL,
    "MarginPurchaseYesterdayBalance" BIGINT NOT NULL,
    "MarginPurchaseTodayBalance" BIGINT NOT NULL,
    "MarginPurchaseLimit" BIGINT NOT NULL,
    "ShortSaleBuy" BIGINT NOT NULL,
    "ShortSaleSell" BIGINT NOT NULL,
    "ShortSaleCashRepayment" BIGINT NOT NULL,
    "ShortSaleYesterdayBalance" BIGINT NOT NULL,
    "ShortSaleTodayBalance" BIGINT NOT NULL,
    "ShortSaleLimit" BIGINT NOT NULL,
    "OffsetLoanAndShort" BIGINT NOT NULL,
    "Note" TEXT NOT NULL,
    "Date" TEXT NOT NULL,
    PRIMARY KEY("StockID", "Date")
);

CREATE TABLE IF NOT EXISTS taiwan_share_holding (
    "Date" TEXT NOT NULL,
    "StockID" TEXT NOT NULL,
    "ShareholdingLevel" BIGINT NOT NULL,
    "NumberOfHolders" BIGINT NOT NULL,
    "NumberOfShares" BIGINT NOT NULL,
    "PercentageOfTotalShares" DOUBLE NOT NULL,
    PRIMARY KEY("StockID", "Date", "ShareholdingLevel")
);
"#,
    },
];

pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )?;

    for migration in MIGRATIONS {
        let already_applied: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            ::duckdb::params![migration.version],
            |row| row.get(0),
        )?;
        if already_applied > 0 {
            continue;
        }

        connection.execute_batch(migration.sql)?;
        connection.execute(
            "INSERT INTO schema_migrations (version) VALUES (?)",
            ::duckdb::params![migration.version],
        )?;
    }

    Ok(())
}
