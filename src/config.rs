use std::{env, path::PathBuf, str::FromStr};

use anyhow::Result;
use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{declare::FeedShape, logging};

const CONFIG_PATH: &str = "app.json";

const DEFAULT_FEED_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vQlR9zaL-9jbKA5TgzfRUYASiElCc_fIZ3BdfMmzt5_YPIzrGD4b5NXJHKfOPaTkkbH5SadjhOxwrrN/pub?output=csv";
const DEFAULT_CURRENCY_URL: &str = "https://api.exchangerate.host/latest?base=USD&symbols=ZAR";
const DEFAULT_OIL_URL: &str = "https://api.api-ninjas.com/v1/oilprice?type=brent";

/// `/*O_o*/\ngoogle.visualization.Query.setResponse(` 的長度
pub const DEFAULT_TABLE_PREFIX_LEN: usize = 47;
/// `);` 的長度
pub const DEFAULT_TABLE_SUFFIX_LEN: usize = 2;

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub feed: Feed,
    #[serde(default)]
    pub market: Market,
    #[serde(default)]
    pub display: Display,
    #[serde(default)]
    pub http: Http,
}

const FEED_URL: &str = "FEED_URL";
const FEED_SHAPE: &str = "FEED_SHAPE";
const FEED_CRON: &str = "FEED_CRON";
const FEED_REJECT_EMPTY: &str = "FEED_REJECT_EMPTY";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Feed {
    #[serde(default = "default_feed_url")]
    pub url: String,
    #[serde(default)]
    pub shape: FeedShape,
    /// 表格 JSON 前綴要去掉的字元數
    #[serde(default = "default_prefix_len")]
    pub prefix_len: usize,
    /// 表格 JSON 後綴要去掉的字元數
    #[serde(default = "default_suffix_len")]
    pub suffix_len: usize,
    /// 沒有任何有效資料列時視為失敗，保留上一份資料
    #[serde(default)]
    pub reject_empty: bool,
    #[serde(default = "default_feed_cron")]
    pub cron: String,
}

impl Default for Feed {
    fn default() -> Self {
        Feed {
            url: default_feed_url(),
            shape: FeedShape::default(),
            prefix_len: DEFAULT_TABLE_PREFIX_LEN,
            suffix_len: DEFAULT_TABLE_SUFFIX_LEN,
            reject_empty: false,
            cron: default_feed_cron(),
        }
    }
}

const MARKET_CURRENCY_URL: &str = "MARKET_CURRENCY_URL";
const MARKET_OIL_URL: &str = "MARKET_OIL_URL";
const MARKET_OIL_API_KEY: &str = "MARKET_OIL_API_KEY";
const MARKET_CRON: &str = "MARKET_CRON";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Market {
    #[serde(default = "default_currency_url")]
    pub currency_url: String,
    #[serde(default = "default_oil_url")]
    pub oil_url: String,
    #[serde(default = "default_oil_api_key")]
    pub oil_api_key: String,
    #[serde(default = "default_market_cron")]
    pub cron: String,
    /// 每次成功更新油價資料後一併更新市場數據
    #[serde(default = "default_true")]
    pub follow_feed: bool,
}

impl Default for Market {
    fn default() -> Self {
        Market {
            currency_url: default_currency_url(),
            oil_url: default_oil_url(),
            oil_api_key: default_oil_api_key(),
            cron: default_market_cron(),
            follow_feed: true,
        }
    }
}

const DISPLAY_FUEL_TYPE: &str = "DISPLAY_FUEL_TYPE";
const DISPLAY_REGION: &str = "DISPLAY_REGION";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Display {
    /// 啟動時選取的油品，空字串時取資料中的第一個
    #[serde(default)]
    pub fuel_type: String,
    /// 啟動時選取的區域，空字串時取資料中的第一個
    #[serde(default)]
    pub region: String,
    #[serde(default = "default_exclusions")]
    pub exclusions: Vec<Exclusion>,
}

impl Default for Display {
    fn default() -> Self {
        Display {
            fuel_type: String::new(),
            region: String::new(),
            exclusions: default_exclusions(),
        }
    }
}

/// 現實中不存在的油品與區域組合
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub fuel_type: String,
    pub region: String,
}

const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Http {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Http {
    fn default() -> Self {
        Http {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_prefix_len() -> usize {
    DEFAULT_TABLE_PREFIX_LEN
}

fn default_suffix_len() -> usize {
    DEFAULT_TABLE_SUFFIX_LEN
}

fn default_feed_cron() -> String {
    // 每分鐘
    "0 * * * * *".to_string()
}

fn default_currency_url() -> String {
    DEFAULT_CURRENCY_URL.to_string()
}

fn default_oil_url() -> String {
    DEFAULT_OIL_URL.to_string()
}

fn default_oil_api_key() -> String {
    "demo".to_string()
}

fn default_market_cron() -> String {
    // 每五分鐘的第 30 秒
    "30 */5 * * * *".to_string()
}

fn default_true() -> bool {
    true
}

fn default_exclusions() -> Vec<Exclusion> {
    vec![Exclusion {
        fuel_type: "Petrol 93".to_string(),
        region: "Coastal".to_string(),
    }]
}

fn default_timeout_secs() -> u64 {
    15
}

pub static SETTINGS: Lazy<App> = Lazy::new(|| {
    App::get().unwrap_or_else(|why| {
        logging::error_file_async(format!(
            "I can't read the config context because {:?}",
            why
        ));
        App::default().override_with_env()
    })
});

impl App {
    fn get() -> Result<Self> {
        let config_path = config_path();
        if config_path.exists() {
            let config: App = config_config::builder()
                .add_source(config_file::from(config_path))
                .build()?
                .try_deserialize()?;
            return Ok(config.override_with_env());
        }

        Ok(App::default().override_with_env())
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(url) = env::var(FEED_URL) {
            self.feed.url = url;
        }

        if let Ok(shape) = env::var(FEED_SHAPE) {
            match FeedShape::from_str(&shape) {
                Ok(shape) => self.feed.shape = shape,
                Err(why) => {
                    logging::error_file_async(format!(
                        "Failed to parse {}({}) because {:?}",
                        FEED_SHAPE, shape, why
                    ));
                }
            }
        }

        if let Ok(cron) = env::var(FEED_CRON) {
            self.feed.cron = cron;
        }

        if let Ok(reject_empty) = env::var(FEED_REJECT_EMPTY) {
            self.feed.reject_empty = bool::from_str(&reject_empty).unwrap_or(false);
        }

        if let Ok(url) = env::var(MARKET_CURRENCY_URL) {
            self.market.currency_url = url;
        }

        if let Ok(url) = env::var(MARKET_OIL_URL) {
            self.market.oil_url = url;
        }

        if let Ok(key) = env::var(MARKET_OIL_API_KEY) {
            self.market.oil_api_key = key;
        }

        if let Ok(cron) = env::var(MARKET_CRON) {
            self.market.cron = cron;
        }

        if let Ok(fuel_type) = env::var(DISPLAY_FUEL_TYPE) {
            self.display.fuel_type = fuel_type;
        }

        if let Ok(region) = env::var(DISPLAY_REGION) {
            self.display.region = region;
        }

        if let Ok(secs) = env::var(HTTP_TIMEOUT_SECS) {
            self.http.timeout_secs = u64::from_str(&secs).unwrap_or_else(|_| default_timeout_secs());
        }

        self
    }
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let app = App::default();
        assert_eq!(app.feed.shape, FeedShape::Csv);
        assert_eq!(app.feed.prefix_len, 47);
        assert_eq!(app.feed.suffix_len, 2);
        assert_eq!(app.feed.cron, "0 * * * * *");
        assert!(!app.feed.reject_empty);
        assert!(app.market.follow_feed);
        assert_eq!(app.market.oil_api_key, "demo");
        assert_eq!(app.http.timeout_secs, 15);
        assert_eq!(
            app.display.exclusions,
            vec![Exclusion {
                fuel_type: "Petrol 93".to_string(),
                region: "Coastal".to_string()
            }]
        );
    }

    #[test]
    fn test_deserialize_partial_json() {
        let json = r#"{
            "feed": { "shape": "table", "prefix_len": 40 },
            "display": { "fuel_type": "Diesel", "region": "Inland" }
        }"#;
        let app: App = serde_json::from_str(json).unwrap();

        assert_eq!(app.feed.shape, FeedShape::Table);
        assert_eq!(app.feed.prefix_len, 40);
        assert_eq!(app.feed.suffix_len, 2);
        assert_eq!(app.feed.url, DEFAULT_FEED_URL);
        assert_eq!(app.display.fuel_type, "Diesel");
        assert_eq!(app.display.exclusions.len(), 1);
        assert_eq!(app.market.currency_url, DEFAULT_CURRENCY_URL);
    }

    #[tokio::test]
    async fn test_init() {
        dotenv::dotenv().ok();
        logging::debug_file_async(format!("SETTINGS.feed: {:#?}\r\n", SETTINGS.feed));
        logging::debug_file_async(format!("SETTINGS.market: {:#?}\r\n", SETTINGS.market));
        logging::debug_file_async(format!("SETTINGS.display: {:#?}\r\n", SETTINGS.display));
    }
}
