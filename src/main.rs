use anyhow::{anyhow, Result};

pub mod cache;
pub mod config;
pub mod crawler;
pub mod declare;
pub mod logging;
pub mod util;
pub mod watchlist;
pub mod web;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install the default crypto provider"))?;

    logging::info_console("the service is starting".to_string());

    web::serve().await
}
