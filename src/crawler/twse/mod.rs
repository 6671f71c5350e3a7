/// 國際證券辨識（股票主檔）
pub mod isin;

const HOST: &str = "isin.twse.com.tw";
