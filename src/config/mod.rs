use std::{env, path::PathBuf};

use config::{Config, File as ConfigFile};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::logging;

const CONFIG_PATH: &str = "app.json";

const WEB_BIND: &str = "WEB_BIND";
const FINTASTIC_DOCUMENT_ID: &str = "FINTASTIC_DOCUMENT_ID";
const FINTASTIC_WORKSHEET: &str = "FINTASTIC_WORKSHEET";
const FINTASTIC_SYMBOL_MARKER: &str = "FINTASTIC_SYMBOL_MARKER";
const FINTASTIC_RANK_MARKER: &str = "FINTASTIC_RANK_MARKER";

pub static SETTINGS: Lazy<App> = Lazy::new(App::get);

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub system: System,
    #[serde(default)]
    pub fintastic: Fintastic,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct System {
    /// Web 服務監聽位址
    #[serde(default = "System::default_web_bind")]
    pub web_bind: String,
}

/// 美股 RS Rank 試算表的來源設定。
///
/// 上游工作表的欄位順序沒有保證，因此以標頭子字串（marker）比對欄位，
/// marker 做成設定值而不是寫死，版面改動時只需調整設定。
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Fintastic {
    /// Google 試算表文件 ID
    #[serde(default = "Fintastic::default_document_id")]
    pub document_id: String,
    /// 工作表名稱
    #[serde(default = "Fintastic::default_worksheet")]
    pub worksheet: String,
    /// 代號欄位的標頭子字串
    #[serde(default = "Fintastic::default_symbol_marker")]
    pub symbol_marker: String,
    /// RS Rank 欄位的標頭子字串
    #[serde(default = "Fintastic::default_rank_marker")]
    pub rank_marker: String,
}

impl Default for System {
    fn default() -> Self {
        System {
            web_bind: Self::default_web_bind(),
        }
    }
}

impl System {
    fn default_web_bind() -> String {
        "0.0.0.0:9000".to_string()
    }
}

impl Default for Fintastic {
    fn default() -> Self {
        Fintastic {
            document_id: Self::default_document_id(),
            worksheet: Self::default_worksheet(),
            symbol_marker: Self::default_symbol_marker(),
            rank_marker: Self::default_rank_marker(),
        }
    }
}

impl Fintastic {
    fn default_document_id() -> String {
        "18EWLoHkh2aiJIKQsJnjOjPo63QFxkUE2U_K8ffHCn1E".to_string()
    }

    fn default_worksheet() -> String {
        "FinTasticRS".to_string()
    }

    fn default_symbol_marker() -> String {
        "Symbol".to_string()
    }

    fn default_rank_marker() -> String {
        "RS Rnk".to_string()
    }
}

impl Default for App {
    fn default() -> Self {
        App {
            system: Default::default(),
            fintastic: Default::default(),
        }
    }
}

impl App {
    fn get() -> Self {
        let config_path = config_path();
        let app = if config_path.exists() {
            match Config::builder()
                .add_source(ConfigFile::from(config_path))
                .build()
                .and_then(|c| c.try_deserialize::<App>())
            {
                Ok(app) => app,
                Err(why) => {
                    logging::error_file_async(format!(
                        "I can't read the config context because {:?}",
                        why
                    ));
                    Default::default()
                }
            }
        } else {
            Default::default()
        };

        app.override_with_env()
    }

    /// 將來自 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(bind) = env::var(WEB_BIND) {
            self.system.web_bind = bind;
        }

        if let Ok(document_id) = env::var(FINTASTIC_DOCUMENT_ID) {
            self.fintastic.document_id = document_id;
        }

        if let Ok(worksheet) = env::var(FINTASTIC_WORKSHEET) {
            self.fintastic.worksheet = worksheet;
        }

        if let Ok(symbol_marker) = env::var(FINTASTIC_SYMBOL_MARKER) {
            self.fintastic.symbol_marker = symbol_marker;
        }

        if let Ok(rank_marker) = env::var(FINTASTIC_RANK_MARKER) {
            self.fintastic.rank_marker = rank_marker;
        }

        self
    }
}

fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}
