/// 美股 RS Rank 試算表
pub mod rank;

const HOST: &str = "docs.google.com";
