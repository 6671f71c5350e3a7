use thiserror::Error;

/// 美股 RS Rank 試算表
pub mod fintastic;
/// 嘉實資訊-理財網
pub mod moneydj;
/// 台灣證券交易所
pub mod twse;
/// 雅虎財經
pub mod yahoo;

/// 需要讓呼叫端分辨失敗原因的抓取錯誤。
///
/// 台股主檔與 MoneyDJ 清單走靜默降級（失敗回空集合），
/// 美股試算表與基本面查詢則必須把錯誤往上拋，
/// 否則「查無資料」與「抓取失敗」無法區分。
#[derive(Debug, Error)]
pub enum FetchError {
    /// 網路或上游回應異常
    #[error("failed to fetch remote data: {0}")]
    FetchFailed(String),
    /// 欄位標頭比對不到設定的 marker，上游版面可能已改動
    #[error("no column header contains the marker {0:?}")]
    SchemaNotFound(String),
}
