use concat_string::concat_string;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    crawler::{yahoo, FetchError},
    declare::FundamentalsSnapshot,
    logging, util,
};

/// quoteSummary 一次帶出快照需要的所有模組
const MODULES: &str = "assetProfile,price,summaryDetail,defaultKeyStatistics,financialData,incomeStatementHistoryQuarterly";

/// Yahoo 的數值欄位都包在 `{"raw": ..., "fmt": "..."}` 裡，只取 raw。
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<Decimal>,
}

impl RawValue {
    fn value(&self) -> Decimal {
        self.raw.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    asset_profile: AssetProfile,
    #[serde(default)]
    price: Price,
    #[serde(default)]
    summary_detail: SummaryDetail,
    #[serde(default)]
    default_key_statistics: DefaultKeyStatistics,
    #[serde(default)]
    financial_data: FinancialData,
    #[serde(default)]
    income_statement_history_quarterly: IncomeStatementHistoryQuarterly,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Price {
    long_name: Option<String>,
    short_name: Option<String>,
    #[serde(default)]
    regular_market_price: RawValue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(default)]
    fifty_two_week_high: RawValue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefaultKeyStatistics {
    #[serde(default)]
    float_shares: RawValue,
    #[serde(default)]
    held_percent_institutions: RawValue,
    #[serde(default)]
    earnings_quarterly_growth: RawValue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    #[serde(default)]
    current_price: RawValue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeStatementHistoryQuarterly {
    #[serde(default)]
    income_statement_history: Vec<IncomeStatement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeStatement {
    #[serde(default)]
    net_income: RawValue,
}

/// 抓取個股的 CANSLIM 基本面快照，每次請求即時抓、不落地。
///
/// 個別欄位缺漏以零值補上，整筆抓不到或查無此代號才回錯誤。
/// 大盤趨勢另外向 [`yahoo::chart`] 查詢，查詢失敗時以 Unknown 呈現，
/// 不拖垮整個快照。
pub async fn fetch_fundamentals(stock_symbol: &str) -> Result<FundamentalsSnapshot, FetchError> {
    let url = concat_string!(
        "https://",
        yahoo::HOST,
        "/v10/finance/quoteSummary/",
        urlencoding::encode(stock_symbol),
        "?modules=",
        MODULES
    );

    let response: QuoteSummaryResponse = util::http::get_json(&url).await.map_err(|why| {
        logging::error_file_async(format!(
            "Failed to fetch the quote summary for {} because {:?}",
            stock_symbol, why
        ));
        FetchError::FetchFailed(why.to_string())
    })?;

    let result = response
        .quote_summary
        .result
        .and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                Some(results.remove(0))
            }
        })
        .ok_or_else(|| {
            FetchError::FetchFailed(format!("quoteSummary has no result for {}", stock_symbol))
        })?;

    let (eps_growth_qoq, eps_growth_yoy) = earnings_growth(&result);

    let mut price = result.price.regular_market_price.value();
    if price.is_zero() {
        price = result.financial_data.current_price.value();
    }

    let name = result
        .price
        .long_name
        .or(result.price.short_name)
        .unwrap_or_else(|| stock_symbol.to_string());

    Ok(FundamentalsSnapshot {
        stock_symbol: stock_symbol.to_string(),
        name,
        sector: result.asset_profile.sector.unwrap_or_default(),
        industry: result.asset_profile.industry.unwrap_or_default(),
        price,
        float_shares: result.default_key_statistics.float_shares.value(),
        institutional_pct: result.default_key_statistics.held_percent_institutions.value()
            * Decimal::ONE_HUNDRED,
        fifty_two_week_high: result.summary_detail.fifty_two_week_high.value(),
        eps_growth_qoq,
        eps_growth_yoy,
        market_trend: yahoo::chart::market_trend().await,
    })
}

/// 由季度損益表計算稅後淨利的季增率與年增率。
///
/// 季報最新一筆與上一季比是季增率，與四季前（去年同季）比是年增率。
/// 季報整組缺漏時退回 Yahoo 預先算好的 earningsQuarterlyGrowth 當年增率，
/// 此時季增率以零呈現。
fn earnings_growth(result: &QuoteSummaryResult) -> (Decimal, Decimal) {
    let statements = &result
        .income_statement_history_quarterly
        .income_statement_history;

    if let Some(latest) = statements.first().and_then(|s| s.net_income.raw) {
        let qoq = statements
            .get(1)
            .and_then(|s| s.net_income.raw)
            .map(|earlier| growth_rate(latest, earlier))
            .unwrap_or_default();
        let yoy = statements
            .get(3)
            .and_then(|s| s.net_income.raw)
            .map(|earlier| growth_rate(latest, earlier))
            .unwrap_or_default();
        return (qoq, yoy);
    }

    let yoy = result
        .default_key_statistics
        .earnings_quarterly_growth
        .raw
        .map(|growth| growth * Decimal::ONE_HUNDRED)
        .unwrap_or_default();

    (Decimal::ZERO, yoy)
}

/// 成長率 (%)。基期為零時除不了，以零呈現而不是除以零。
fn growth_rate(latest: Decimal, earlier: Decimal) -> Decimal {
    if earlier.is_zero() {
        return Decimal::ZERO;
    }

    (latest - earlier) / earlier.abs() * Decimal::ONE_HUNDRED
}
