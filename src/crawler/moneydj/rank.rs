use once_cell::sync::Lazy;
use regex::Regex;

use crate::{crawler::moneydj, logging, util};

/// 清單藏在回應頁面的 script 變數指派裡，取出單引號內的字串。
static REG_STOCK_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"parent\.sStklistAll\s*=\s*'([^']+)'").expect("Failed to compile stock list regex")
});

/// 抓取 MoneyDJ 的台股 RS Rank 清單。
///
/// * `window_weeks` - 統計週數
/// * `min_rank` - RS Rank 下限
///
/// 任何網路、解碼或比對失敗都回傳空集合，不往上拋錯，
/// 呼叫端以空清單呈現即可。
pub async fn fetch_domestic_ranks(window_weeks: u32, min_rank: u32) -> Vec<String> {
    let url = format!(
        "https://{}/z/zk/zkf/zkResult.asp?D=1&A=x@250,a@{},b@{}&site=",
        moneydj::HOST,
        window_weeks,
        min_rank
    );

    match util::http::get_use_big5(&url).await {
        Ok(body) => extract_stock_list(&body),
        Err(why) => {
            logging::error_file_async(format!(
                "Failed to fetch the MoneyDJ rank list because {:?}",
                why
            ));
            Vec::new()
        }
    }
}

/// 從回應內容取出股票代號清單。
///
/// 取出的字串還帶著 `\uXXXX` 逃逸字元，必須先還原再用逗號切割；
/// 台股代號全為數字，非數字的片段直接丟棄。
pub(crate) fn extract_stock_list(body: &str) -> Vec<String> {
    let Some(caps) = REG_STOCK_LIST.captures(body) else {
        return Vec::new();
    };

    let unescaped = util::text::unescape_unicode(&caps[1]);

    unescaped
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_stock_list() {
        let body = "var x=1; parent.sStklistAll='2330,2317,abc,'; other();";
        assert_eq!(extract_stock_list(body), vec!["2330", "2317"]);
    }

    #[test]
    fn test_extract_stock_list_with_escapes() {
        // MoneyDJ 的清單常以 \uXXXX 逃逸形式出現
        let body = r"parent.sStklistAll = '\u0032\u0033\u0033\u0030,2317,1101';";
        assert_eq!(extract_stock_list(body), vec!["2330", "2317", "1101"]);
    }

    #[test]
    fn test_extract_stock_list_missing_assignment() {
        assert!(extract_stock_list("<html>nothing here</html>").is_empty());
        assert!(extract_stock_list("").is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_domestic_ranks() {
        dotenv::dotenv().ok();
        let codes = fetch_domestic_ranks(2, 80).await;
        logging::debug_file_async(format!("codes:{:?}", codes));
    }
}
