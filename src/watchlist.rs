use chrono::{FixedOffset, Utc};
use hashbrown::HashMap;

use crate::declare::{DirectoryEntry, RankedTicker, StockExchange, WatchListEntry};

/// 匯出檔名使用台北時間（UTC+8）的日期
const TAIPEI_OFFSET_SECS: i32 = 8 * 3600;

/// 將排行清單整理成觀察清單與 TradingView 匯入字串。
///
/// * `tickers` - 依分數排好序的排行清單
/// * `directory` - 台股主檔對照表；美股沒有主檔，傳 `None`
/// * `limit` - 清單上限，超過的尾端直接截掉
///
/// 台股代號查不到主檔時以「代號 XXXX」當名稱、市場別當作上市處理，
/// 清單不因主檔缺漏而少一筆。
/// 輸入相同時輸出必定相同，重複呼叫產生的匯入字串逐位元相等。
pub fn build_watchlist(
    tickers: &[RankedTicker],
    directory: Option<&HashMap<String, DirectoryEntry>>,
    limit: usize,
) -> (Vec<WatchListEntry>, String) {
    let mut entries: Vec<WatchListEntry> = Vec::with_capacity(limit.min(tickers.len()));

    for ticker in tickers.iter().take(limit) {
        let entry = match directory {
            Some(directory) => match directory.get(&ticker.stock_symbol) {
                Some(found) => WatchListEntry {
                    stock_symbol: found.stock_symbol.clone(),
                    name: found.name.clone(),
                    prefix: found.exchange.tag().to_string(),
                },
                None => WatchListEntry {
                    stock_symbol: ticker.stock_symbol.clone(),
                    name: format!("代號 {}", ticker.stock_symbol),
                    prefix: StockExchange::TWSE.tag().to_string(),
                },
            },
            None => WatchListEntry {
                stock_symbol: ticker.stock_symbol.clone(),
                name: ticker.stock_symbol.clone(),
                prefix: foreign_exchange_prefix(&ticker.stock_symbol).to_string(),
            },
        };

        entries.push(entry);
    }

    let trading_view = entries
        .iter()
        .map(|entry| format!("{}:{}", entry.prefix, entry.stock_symbol))
        .collect::<Vec<_>>()
        .join(",");

    (entries, trading_view)
}

/// 猜測美股代號所屬交易所。
///
/// 來源試算表沒有交易所欄位，只能用代號長度猜：四碼以上多半是 NASDAQ、
/// 短代號多半是 NYSE。猜錯時 TradingView 匯入仍可解析，只是前綴不準。
fn foreign_exchange_prefix(stock_symbol: &str) -> &'static str {
    if stock_symbol.len() >= 4 {
        "NASDAQ"
    } else {
        "NYSE"
    }
}

/// 匯出檔名：`{market}_{YYYY}_{MM}_{DD}.txt`，日期取台北時間。
pub fn export_file_name(market: &str) -> String {
    let offset = FixedOffset::east_opt(TAIPEI_OFFSET_SECS).expect("TAIPEI_OFFSET_SECS is valid");
    let today = Utc::now().with_timezone(&offset);

    format!("{}_{}.txt", market, today.format("%Y_%m_%d"))
}
