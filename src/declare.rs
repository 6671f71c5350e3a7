use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

/// 美股代號格式：1~5 個大寫英文字母，允許一個內部分隔符號（例：BRK.B、BF-B 的股別）。
static REG_FOREIGN_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,5}([.-][A-Z])?$").expect("Failed to compile symbol regex"));

/// 交易所
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum StockExchange {
    /// 臺灣證券交易所
    TWSE,
    /// 證券櫃檯買賣市場
    TPEx,
}

impl StockExchange {
    /// isin.twse.com.tw 查詢頁的 strMode 參數，上市:2 上櫃:4
    pub fn isin_mode(&self) -> i32 {
        match self {
            StockExchange::TWSE => 2,
            StockExchange::TPEx => 4,
        }
    }

    /// TradingView 匯入清單使用的市場前綴
    pub fn tag(&self) -> &'static str {
        match self {
            StockExchange::TWSE => "TWSE",
            StockExchange::TPEx => "TPEX",
        }
    }

    pub fn iterator() -> impl Iterator<Item = Self> {
        [Self::TWSE, Self::TPEx].into_iter()
    }
}

/// 台股股票主檔的單筆資料，來源為 ISIN 國際證券識別碼頁面
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryEntry {
    pub stock_symbol: String,
    pub name: String,
    pub exchange: StockExchange,
}

/// 含 RS Rank 分數的股票代號
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTicker {
    pub stock_symbol: String,
    pub rank: Decimal,
}

/// 顯示與匯出用的觀察清單項目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchListEntry {
    pub stock_symbol: String,
    pub name: String,
    pub prefix: String,
}

/// 大盤趨勢
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum MarketTrend {
    Bullish,
    Bearish,
    Unknown,
}

/// 單一個股的 CANSLIM 基本面快照，每次請求重新抓取、不落地
#[derive(Debug, Clone, Serialize)]
pub struct FundamentalsSnapshot {
    pub stock_symbol: String,
    pub name: String,
    pub sector: String,
    pub industry: String,
    /// 現價
    pub price: Decimal,
    /// 流通股數
    pub float_shares: Decimal,
    /// 法人持股比例 (%)
    pub institutional_pct: Decimal,
    /// 52 週高點
    pub fifty_two_week_high: Decimal,
    /// 當季稅後淨利較上一季的成長率 (%)
    pub eps_growth_qoq: Decimal,
    /// 當季稅後淨利較去年同季的成長率 (%)
    pub eps_growth_yoy: Decimal,
    pub market_trend: MarketTrend,
}

/// 檢查是否符合美股代號格式，不符合者在解析階段直接丟棄
pub fn is_valid_foreign_symbol(stock_symbol: &str) -> bool {
    REG_FOREIGN_SYMBOL.is_match(stock_symbol)
}
