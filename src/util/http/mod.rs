use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use once_cell::sync::{Lazy, OnceCell};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;

use crate::{logging, util};

pub mod user_agent;

/// 限制最多 4 個並發請求，避免被目標網站封禁。
static SEMAPHORE: Lazy<Semaphore> = Lazy::new(|| Semaphore::new(4));

/// A singleton instance of the reqwest client.
static CLIENT: OnceCell<Client> = OnceCell::new();

/// HTTP 請求失敗時的最大重試次數。
const MAX_RETRIES: usize = 2;

/// 將 reqwest::Response 的內容以 Big5 解碼成 UTF-8 字串。
///
/// ISIN 主檔與 MoneyDJ 的頁面都是 Big5/MS950 編碼，直接用 `text()` 會得到亂碼。
#[async_trait]
pub trait TextForceBig5 {
    async fn text_force_big5(self) -> Result<String>;
}

#[async_trait]
impl TextForceBig5 for Response {
    async fn text_force_big5(self) -> Result<String> {
        util::text::big5_2_utf8(self.bytes().await?.as_ref())
    }
}

fn get_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .brotli(true)
            .gzip(true)
            .zstd(true)
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .tcp_nodelay(true)
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(90))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .referer(true)
            .user_agent(user_agent::gen_random_ua())
            .build()
            .map_err(|e| anyhow!("Failed to create reqwest client: {:?}", e))
    })
}

/// Performs an HTTP GET request and returns the response as text.
pub async fn get(url: &str, headers: Option<header::HeaderMap>) -> Result<String> {
    send(Method::GET, url, headers)
        .await?
        .text()
        .await
        .map_err(|e| anyhow!("Error parsing response text: {:?}", e))
}

/// Performs an HTTP GET request and deserializes the JSON response into the specified type.
pub async fn get_json<RES: DeserializeOwned>(url: &str) -> Result<RES> {
    send(Method::GET, url, None)
        .await?
        .json::<RES>()
        .await
        .map_err(|e| anyhow!("Error parsing response JSON: {:?}", e))
}

/// Performs an HTTP GET request and returns the Big5-encoded response as UTF-8 text.
pub async fn get_use_big5(url: &str) -> Result<String> {
    send(Method::GET, url, None)
        .await?
        .text_force_big5()
        .await
        .map_err(|e| anyhow!("Error parsing response text use BIG5: {:?}", e))
}

/// Sends an HTTP request with bounded retries.
///
/// 失敗時以指數遞增的間隔重試，全部失敗才回傳錯誤。
async fn send(
    method: Method,
    url: &str,
    headers: Option<header::HeaderMap>,
) -> Result<Response> {
    let visit_log = format!("{method}:{url}");
    let client = get_client()?;
    let mut rb: RequestBuilder = client.request(method, url);
    let mut last_error = String::new();

    if let Some(h) = headers {
        rb = rb.headers(h);
    }

    for attempt in 1..=MAX_RETRIES {
        let rb_clone = rb
            .try_clone()
            .ok_or_else(|| anyhow!("Failed to clone RequestBuilder"))?;
        let permit = SEMAPHORE.acquire().await;
        let start = Instant::now();
        let res = rb_clone.send().await;
        let elapsed = start.elapsed().as_millis();
        drop(permit);

        match res {
            Ok(response) => {
                logging::debug_file_async(format!("{} {} ms", visit_log, elapsed));
                return Ok(response);
            }
            Err(why) => {
                last_error = format!("{:?}", why);
                logging::error_file_async(format!(
                    "Attempt {} to send {} failed because {:?}. {} ms",
                    attempt, visit_log, why, elapsed
                ));
                if attempt < MAX_RETRIES {
                    tokio::time::sleep(Duration::from_secs(2u64.pow(attempt as u32))).await;
                }
            }
        }
    }

    Err(anyhow!(
        "Failed to send request to {} after {} attempts; last error: {}",
        url,
        MAX_RETRIES,
        last_error
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn test_get() {
        match get("https://httpbin.org/ip", None).await {
            Ok(body) => {
                dbg!(body);
            }
            Err(why) => {
                logging::error_file_async(format!("Failed to get because {:?}", why));
            }
        }
    }
}
