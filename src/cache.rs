//! 全域快取模組。
//!
//! 股票主檔一週才變動一次，每次查詢都重抓 ISIN 頁面沒有意義，
//! 因此以 [`SHARE`] 快取主檔查詢結果，TTL 為 7 天。
//! 各個抓取函數本身維持無狀態，快取屬於呼叫端的責任。

use std::{sync::Arc, time::Duration};

use hashbrown::HashMap;
use moka::sync::Cache;
use once_cell::sync::Lazy;

use crate::{crawler::twse, declare::DirectoryEntry, logging};

/// 股票主檔快取的 TTL，主檔極少變動，以一週為期。
const DIRECTORY_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const DIRECTORY_KEY: &str = "twse:isin";

/// 全域共享快取實例。
pub static SHARE: Lazy<Share> = Lazy::new(Default::default);

pub struct Share {
    /// 台股股票主檔，key 為快取名稱（僅一筆）
    directory: Cache<&'static str, Arc<HashMap<String, DirectoryEntry>>>,
}

impl Share {
    pub fn new() -> Self {
        Share {
            directory: Cache::builder()
                .max_capacity(4)
                .time_to_live(DIRECTORY_TTL)
                .build(),
        }
    }

    /// 取得台股股票主檔，快取未命中時向 ISIN 頁面重新抓取。
    ///
    /// 抓取失敗（回傳空主檔）時不寫入快取，下一次呼叫會再重試。
    pub async fn directory(&self) -> Arc<HashMap<String, DirectoryEntry>> {
        if let Some(directory) = self.directory.get(DIRECTORY_KEY) {
            return directory;
        }

        let loaded = Arc::new(twse::isin::load_directory().await);
        if loaded.is_empty() {
            logging::warn_file_async(
                "The stock directory is empty and will not be cached.".to_string(),
            );
        } else {
            self.directory.insert(DIRECTORY_KEY, loaded.clone());
        }

        loaded
    }

    pub fn invalidate_directory(&self) {
        self.directory.invalidate(DIRECTORY_KEY);
    }
}

impl Default for Share {
    fn default() -> Self {
        Self::new()
    }
}
