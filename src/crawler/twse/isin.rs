use hashbrown::HashMap;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::{
    crawler::twse,
    declare::{DirectoryEntry, StockExchange},
    logging, util,
};

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.h4 tr").expect("Failed to parse isin row selector"));

static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Failed to parse isin cell selector"));

/// 載入台股股票主檔（上市 + 上櫃），回傳代號對應名稱與市場別的對照表。
///
/// 任一市場別抓取或解析失敗時只記 log，該市場別不貢獻任何資料，
/// 函數本身永遠不回傳錯誤，最壞情況是空的對照表。
/// 同一代號重複出現時，後載入的市場別覆蓋先前的。
pub async fn load_directory() -> HashMap<String, DirectoryEntry> {
    let mut directory: HashMap<String, DirectoryEntry> = HashMap::with_capacity(4096);

    for exchange in StockExchange::iterator() {
        let url = format!(
            "https://{}/isin/C_public.jsp?strMode={}",
            twse::HOST,
            exchange.isin_mode()
        );

        match util::http::get_use_big5(&url).await {
            Ok(text) => merge_directory_page(&text, exchange, &mut directory),
            Err(why) => {
                logging::error_file_async(format!(
                    "Failed to fetch the ISIN page for {:?} because {:?}",
                    exchange, why
                ));
            }
        }
    }

    directory
}

/// 解析一個市場別的 ISIN 頁面並併入對照表。
///
/// 每列的第一格長相是「2330　台積電」（全形空白分隔），
/// 正規化後切割，第一段全為數字且至少兩段才算一筆有效資料。
pub(crate) fn merge_directory_page(
    html: &str,
    exchange: StockExchange,
    directory: &mut HashMap<String, DirectoryEntry>,
) {
    let document = Html::parse_document(html);

    for row in document.select(&ROW_SELECTOR) {
        let Some(cell) = row.select(&CELL_SELECTOR).next() else {
            continue;
        };

        let text = cell.text().collect::<String>();
        let normalized = text.replace('\u{3000}', " ");
        let mut parts = normalized.split_whitespace();

        let (Some(stock_symbol), Some(name)) = (parts.next(), parts.next()) else {
            continue;
        };

        if !stock_symbol.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        directory.insert(
            stock_symbol.to_string(),
            DirectoryEntry {
                stock_symbol: stock_symbol.to_string(),
                name: name.to_string(),
                exchange,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body><table class="h4">
            <tr><td>有價證券代號及名稱</td><td>國際證券辨識號碼</td></tr>
            <tr><td> 股票 </td></tr>
            <tr><td>2330　台積電</td><td>TW0002330008</td></tr>
            <tr><td>2317　鴻海</td><td>TW0002317005</td></tr>
            <tr><td>TSMC　不是數字</td><td>XX</td></tr>
            <tr><td>9999</td><td>缺名稱</td></tr>
        </table></body></html>"#;

    #[test]
    fn test_merge_directory_page() {
        let mut directory = HashMap::new();
        merge_directory_page(FIXTURE, StockExchange::TWSE, &mut directory);

        assert_eq!(directory.len(), 2);
        let tsmc = directory.get("2330").unwrap();
        assert_eq!(tsmc.name, "台積電");
        assert_eq!(tsmc.exchange, StockExchange::TWSE);
        assert!(directory.contains_key("2317"));
        // 首段非數字或缺名稱的列不收
        assert!(!directory.contains_key("TSMC"));
        assert!(!directory.contains_key("9999"));
    }

    #[test]
    fn test_later_exchange_wins_on_duplicate() {
        let mut directory = HashMap::new();
        merge_directory_page(FIXTURE, StockExchange::TWSE, &mut directory);
        merge_directory_page(
            r#"<table class="h4"><tr><td>2330　台積電</td></tr></table>"#,
            StockExchange::TPEx,
            &mut directory,
        );

        assert_eq!(
            directory.get("2330").unwrap().exchange,
            StockExchange::TPEx
        );
    }

    #[test]
    fn test_malformed_html_yields_empty_directory() {
        let mut directory = HashMap::new();
        merge_directory_page("<<<<not html at all", StockExchange::TWSE, &mut directory);
        assert!(directory.is_empty());

        merge_directory_page("", StockExchange::TPEx, &mut directory);
        assert!(directory.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_load_directory() {
        dotenv::dotenv().ok();
        let directory = load_directory().await;
        logging::debug_file_async(format!("directory size:{}", directory.len()));
    }
}
