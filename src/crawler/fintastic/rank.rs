use concat_string::concat_string;
use rust_decimal::Decimal;

use crate::{
    config::SETTINGS,
    crawler::{fintastic, FetchError},
    declare::{self, RankedTicker},
    logging, util,
};

/// 抓取美股 RS Rank 試算表，回傳分數不低於 `min_rank` 的代號清單（分數高者在前）。
///
/// 來源是 Google 試算表的 CSV 匯出端點，欄位順序由標頭 marker 比對決定。
/// 與台股清單不同，這裡的失敗必須讓呼叫端知道：
/// 抓不到資料回 [`FetchError::FetchFailed`]，
/// 標頭比對不到 marker 回 [`FetchError::SchemaNotFound`]。
pub async fn fetch_foreign_ranks(min_rank: Decimal) -> Result<Vec<RankedTicker>, FetchError> {
    let fintastic_config = &SETTINGS.fintastic;
    let url = concat_string!(
        "https://",
        fintastic::HOST,
        "/spreadsheets/d/",
        fintastic_config.document_id,
        "/gviz/tq?tqx=out:csv&sheet=",
        urlencoding::encode(&fintastic_config.worksheet)
    );

    let csv = util::http::get(&url, None).await.map_err(|why| {
        logging::error_file_async(format!(
            "Failed to fetch the rank sheet because {:?}",
            why
        ));
        FetchError::FetchFailed(why.to_string())
    })?;

    parse_rank_sheet(
        &csv,
        &fintastic_config.symbol_marker,
        &fintastic_config.rank_marker,
        min_rank,
    )
}

/// 解析試算表 CSV 內容。
///
/// 第一行是標頭，以 marker 子字串比對出代號欄與分數欄的位置。
/// 資料列中：代號去空白轉大寫後須符合美股代號格式，
/// 分數解析失敗或低於 `min_rank` 的列直接略過。
/// 排序使用穩定排序，同分時保留試算表原本的列序。
pub(crate) fn parse_rank_sheet(
    csv: &str,
    symbol_marker: &str,
    rank_marker: &str,
    min_rank: Decimal,
) -> Result<Vec<RankedTicker>, FetchError> {
    let mut lines = csv.lines();
    let header = lines
        .next()
        .ok_or_else(|| FetchError::FetchFailed("the rank sheet is empty".to_string()))?;
    let columns = util::text::split_csv_line(header);

    let symbol_index = locate_column(&columns, symbol_marker)?;
    let rank_index = locate_column(&columns, rank_marker)?;

    let mut tickers: Vec<RankedTicker> = Vec::with_capacity(128);

    for line in lines {
        let fields = util::text::split_csv_line(line);
        let (Some(symbol_field), Some(rank_field)) =
            (fields.get(symbol_index), fields.get(rank_index))
        else {
            continue;
        };

        let stock_symbol = symbol_field.trim().to_uppercase();
        if !declare::is_valid_foreign_symbol(&stock_symbol) {
            continue;
        }

        let Ok(rank) = util::text::parse_decimal(rank_field, None) else {
            continue;
        };

        if rank < min_rank {
            continue;
        }

        tickers.push(RankedTicker { stock_symbol, rank });
    }

    tickers.sort_by(|a, b| b.rank.cmp(&a.rank));

    Ok(tickers)
}

/// 在標頭列中找出包含 marker 子字串的欄位位置。
fn locate_column(columns: &[String], marker: &str) -> Result<usize, FetchError> {
    columns
        .iter()
        .position(|column| column.contains(marker))
        .ok_or_else(|| FetchError::SchemaNotFound(marker.to_string()))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_parse_rank_sheet() {
        let csv = "\"Ticker\",\"RS Rnk 2024\"\n\
                   \"AAPL\",\"95\"\n\
                   \"bad$\",\"80\"\n\
                   \"MSFT\",\"60\"\n";

        let tickers = parse_rank_sheet(csv, "Ticker", "RS Rnk", dec!(70)).unwrap();

        assert_eq!(tickers.len(), 1);
        assert_eq!(tickers[0].stock_symbol, "AAPL");
        assert_eq!(tickers[0].rank, dec!(95));
    }

    #[test]
    fn test_parse_rank_sheet_sorts_descending_and_keeps_ties_stable() {
        let csv = "\"Symbol\",\"RS Rnk\"\n\
                   \"MSFT\",\"80\"\n\
                   \"AAPL\",\"95\"\n\
                   \"NVDA\",\"80\"\n";

        let tickers = parse_rank_sheet(csv, "Symbol", "RS Rnk", dec!(0)).unwrap();

        let symbols: Vec<&str> = tickers.iter().map(|t| t.stock_symbol.as_str()).collect();
        // 同分（MSFT/NVDA）保留原本列序
        assert_eq!(symbols, vec!["AAPL", "MSFT", "NVDA"]);
    }

    #[test]
    fn test_parse_rank_sheet_normalizes_symbols_and_skips_bad_ranks() {
        let csv = "\"Symbol\",\"RS Rnk\"\n\
                   \" aapl \",\"91\"\n\
                   \"BRK.B\",\"not a number\"\n\
                   \"TSLA\",\"\"\n";

        let tickers = parse_rank_sheet(csv, "Symbol", "RS Rnk", dec!(0)).unwrap();

        assert_eq!(tickers.len(), 1);
        assert_eq!(tickers[0].stock_symbol, "AAPL");
    }

    #[test]
    fn test_parse_rank_sheet_threshold_monotonicity() {
        let csv = "\"Symbol\",\"RS Rnk\"\n\
                   \"AAPL\",\"95\"\n\
                   \"MSFT\",\"80\"\n\
                   \"NVDA\",\"70\"\n\
                   \"TSLA\",\"60\"\n";

        let loose = parse_rank_sheet(csv, "Symbol", "RS Rnk", dec!(60)).unwrap();
        let strict = parse_rank_sheet(csv, "Symbol", "RS Rnk", dec!(80)).unwrap();

        // 提高門檻只會從尾端縮短清單，不會改變留下者的順序
        assert!(strict.len() <= loose.len());
        assert_eq!(strict, loose[..strict.len()]);
    }

    #[test]
    fn test_parse_rank_sheet_schema_not_found() {
        let csv = "\"Name\",\"Score\"\n\"AAPL\",\"95\"\n";

        match parse_rank_sheet(csv, "Symbol", "RS Rnk", dec!(0)) {
            Err(FetchError::SchemaNotFound(marker)) => assert_eq!(marker, "Symbol"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rank_sheet_empty_body() {
        assert!(matches!(
            parse_rank_sheet("", "Symbol", "RS Rnk", dec!(0)),
            Err(FetchError::FetchFailed(_))
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_foreign_ranks() {
        dotenv::dotenv().ok();
        match fetch_foreign_ranks(dec!(80)).await {
            Ok(tickers) => {
                logging::debug_file_async(format!("tickers:{:?}", tickers));
            }
            Err(why) => {
                logging::error_file_async(format!(
                    "Failed to fetch_foreign_ranks because {:?}",
                    why
                ));
            }
        }
    }
}
