/// 強勢股排行（RS Rank）清單
pub mod rank;

const HOST: &str = "moneydj.emega.com.tw";
