//! Web 服務層。
//!
//! 台股與美股的錯誤呈現方式不同：
//! 台股來源走靜默降級，抓取失敗時回 200 與空清單；
//! 美股來源的失敗必須讓呼叫端分辨，回 502 與診斷訊息。

use anyhow::Result;
use axum::{
    extract::{Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::{
    cache::SHARE,
    config::SETTINGS,
    crawler::{fintastic, moneydj, yahoo, FetchError},
    declare::{FundamentalsSnapshot, RankedTicker, WatchListEntry},
    logging, watchlist,
};

/// 觀察清單的預設上限
const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct DomesticParams {
    /// RS Rank 統計週數
    #[serde(default = "DomesticParams::default_weeks")]
    weeks: u32,
    /// RS Rank 下限
    #[serde(default = "DomesticParams::default_min_rank")]
    min_rank: u32,
    #[serde(default = "default_limit")]
    limit: usize,
}

impl DomesticParams {
    fn default_weeks() -> u32 {
        2
    }

    fn default_min_rank() -> u32 {
        90
    }
}

#[derive(Debug, Deserialize)]
struct ForeignParams {
    /// RS Rank 下限
    #[serde(default = "ForeignParams::default_min_rank")]
    min_rank: Decimal,
    #[serde(default = "default_limit")]
    limit: usize,
}

impl ForeignParams {
    fn default_min_rank() -> Decimal {
        Decimal::from(90)
    }
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[derive(Debug, Serialize)]
struct WatchlistResponse {
    count: usize,
    watchlist: Vec<WatchListEntry>,
    /// TradingView 匯入字串（`前綴:代號` 以逗號串接）
    tradingview: String,
    /// 建議的匯出檔名
    filename: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// 啟動 web 服務，監聽位址來自設定檔的 `system.web_bind`。
pub async fn serve() -> Result<()> {
    let bind = &SETTINGS.system.web_bind;
    let listener = TcpListener::bind(bind).await?;

    logging::info_file_async(format!("the web service is listening on {}", bind));

    axum::serve(listener, router()).await?;

    Ok(())
}

fn router() -> Router {
    Router::new()
        .route("/api/tw/watchlist", get(tw_watchlist))
        .route("/api/tw/watchlist.txt", get(tw_watchlist_txt))
        .route("/api/us/watchlist", get(us_watchlist))
        .route("/api/us/watchlist.txt", get(us_watchlist_txt))
        .route("/api/us/fundamentals/{stock_symbol}", get(us_fundamentals))
}

async fn tw_watchlist(Query(params): Query<DomesticParams>) -> Json<WatchlistResponse> {
    Json(build_domestic_watchlist(&params).await)
}

async fn tw_watchlist_txt(Query(params): Query<DomesticParams>) -> Response {
    let response = build_domestic_watchlist(&params).await;
    plain_text_attachment(&response)
}

async fn us_watchlist(
    Query(params): Query<ForeignParams>,
) -> Result<Json<WatchlistResponse>, (StatusCode, Json<ErrorBody>)> {
    build_foreign_watchlist(&params)
        .await
        .map(Json)
        .map_err(bad_gateway)
}

async fn us_watchlist_txt(
    Query(params): Query<ForeignParams>,
) -> Result<Response, (StatusCode, Json<ErrorBody>)> {
    build_foreign_watchlist(&params)
        .await
        .map(|response| plain_text_attachment(&response))
        .map_err(bad_gateway)
}

async fn us_fundamentals(
    Path(stock_symbol): Path<String>,
) -> Result<Json<FundamentalsSnapshot>, (StatusCode, Json<ErrorBody>)> {
    yahoo::fundamentals::fetch_fundamentals(&stock_symbol)
        .await
        .map(Json)
        .map_err(bad_gateway)
}

/// 台股觀察清單：來源失敗時清單為空，不回錯誤。
async fn build_domestic_watchlist(params: &DomesticParams) -> WatchlistResponse {
    let codes = moneydj::rank::fetch_domestic_ranks(params.weeks, params.min_rank).await;
    let tickers: Vec<RankedTicker> = codes
        .into_iter()
        .map(|stock_symbol| RankedTicker {
            stock_symbol,
            rank: Decimal::ZERO,
        })
        .collect();

    let directory = SHARE.directory().await;
    let (entries, trading_view) =
        watchlist::build_watchlist(&tickers, Some(&directory), params.limit);

    watchlist_response(entries, trading_view, "TW")
}

async fn build_foreign_watchlist(
    params: &ForeignParams,
) -> Result<WatchlistResponse, FetchError> {
    let tickers = fintastic::rank::fetch_foreign_ranks(params.min_rank).await?;
    let (entries, trading_view) = watchlist::build_watchlist(&tickers, None, params.limit);

    Ok(watchlist_response(entries, trading_view, "US"))
}

fn watchlist_response(
    entries: Vec<WatchListEntry>,
    trading_view: String,
    market: &str,
) -> WatchlistResponse {
    WatchlistResponse {
        count: entries.len(),
        watchlist: entries,
        tradingview: trading_view,
        filename: watchlist::export_file_name(market),
    }
}

/// 以附件形式回傳 TradingView 匯入字串，檔名帶在 Content-Disposition 上。
fn plain_text_attachment(response: &WatchlistResponse) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", response.filename),
            ),
        ],
        response.tradingview.clone(),
    )
        .into_response()
}

fn bad_gateway(why: FetchError) -> (StatusCode, Json<ErrorBody>) {
    logging::error_file_async(format!("the upstream source failed because {:?}", why));

    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorBody {
            error: why.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domestic_params_defaults() {
        let params: DomesticParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.weeks, 2);
        assert_eq!(params.min_rank, 90);
        assert_eq!(params.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_foreign_params_defaults() {
        let params: ForeignParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.min_rank, Decimal::from(90));
        assert_eq!(params.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_watchlist_response_shape() {
        let response = watchlist_response(Vec::new(), String::new(), "US");
        assert_eq!(response.count, 0);
        assert!(response.filename.starts_with("US_"));

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"tradingview\""));
        assert!(json.contains("\"filename\""));
    }
}
