use concat_string::concat_string;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{crawler::yahoo, declare::MarketTrend, logging, util};

/// 大盤以標普 500 指數為代表
const MARKET_INDEX: &str = "^GSPC";

/// 均線天數
const MOVING_AVERAGE_DAYS: usize = 20;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<Decimal>>,
}

/// 查詢大盤趨勢：最新收盤價高於 20 日均線視為多頭，否則空頭。
///
/// 趨勢只是快照上的輔助標記，查詢失敗或資料不足時回傳 Unknown，
/// 不讓大盤查詢的失敗影響個股快照。
pub async fn market_trend() -> MarketTrend {
    let url = concat_string!(
        "https://",
        yahoo::HOST,
        "/v8/finance/chart/",
        urlencoding::encode(MARKET_INDEX),
        "?range=3mo&interval=1d"
    );

    match util::http::get_json::<ChartResponse>(&url).await {
        Ok(response) => {
            let closes = response
                .chart
                .result
                .and_then(|mut results| {
                    if results.is_empty() {
                        None
                    } else {
                        Some(results.remove(0))
                    }
                })
                .and_then(|result| result.indicators.quote.into_iter().next())
                .map(|quote| quote.close.into_iter().flatten().collect::<Vec<_>>())
                .unwrap_or_default();

            classify_trend(&closes)
        }
        Err(why) => {
            logging::error_file_async(format!(
                "Failed to fetch the market index chart because {:?}",
                why
            ));
            MarketTrend::Unknown
        }
    }
}

/// 以最新收盤價與 20 日簡單均線的相對位置判斷趨勢，不足 20 筆無法判斷。
pub(crate) fn classify_trend(closes: &[Decimal]) -> MarketTrend {
    if closes.len() < MOVING_AVERAGE_DAYS {
        return MarketTrend::Unknown;
    }

    let Some(latest) = closes.last() else {
        return MarketTrend::Unknown;
    };

    let window = &closes[closes.len() - MOVING_AVERAGE_DAYS..];
    let moving_average =
        window.iter().sum::<Decimal>() / Decimal::from(MOVING_AVERAGE_DAYS as u32);

    if *latest > moving_average {
        MarketTrend::Bullish
    } else {
        MarketTrend::Bearish
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_classify_trend_bullish() {
        let mut closes = vec![dec!(100); 19];
        closes.push(dec!(120));
        assert_eq!(classify_trend(&closes), MarketTrend::Bullish);
    }

    #[test]
    fn test_classify_trend_bearish() {
        let mut closes = vec![dec!(120); 19];
        closes.push(dec!(100));
        assert_eq!(classify_trend(&closes), MarketTrend::Bearish);

        // 等於均線不算多頭
        assert_eq!(classify_trend(&vec![dec!(100); 20]), MarketTrend::Bearish);
    }

    #[test]
    fn test_classify_trend_insufficient_data() {
        assert_eq!(classify_trend(&[]), MarketTrend::Unknown);
        assert_eq!(classify_trend(&vec![dec!(100); 19]), MarketTrend::Unknown);
    }

    #[test]
    fn test_deserialize_chart() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"symbol": "^GSPC"},
                    "indicators": {"quote": [{"close": [5000.1, null, 5012.5]}]}
                }],
                "error": null
            }
        }"#;

        let response: ChartResponse = serde_json::from_str(json).unwrap();
        let quote = &response.chart.result.unwrap()[0].indicators.quote[0];
        let closes: Vec<Decimal> = quote.close.iter().flatten().copied().collect();
        assert_eq!(closes, vec![dec!(5000.1), dec!(5012.5)]);
    }

    #[tokio::test]
    #[ignore]
    async fn test_market_trend() {
        dotenv::dotenv().ok();
        let trend = market_trend().await;
        logging::debug_file_async(format!("trend:{:?}", trend));
    }
}
