/// 大盤趨勢
pub mod chart;
/// 個股基本面快照
pub mod fundamentals;

const HOST: &str = "query1.finance.yahoo.com";
