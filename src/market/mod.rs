//! # 市場數據
//!
//! 兩個互不相依的唯讀來源：美元兌南非幣匯率與布蘭特原油價格。
//! 任一來源失敗只會讓自己的欄位顯示 [`NOT_AVAILABLE`]，不影響另一個。

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{error::FetchError, logging, util::text};

/// 匯率
pub mod currency;
/// 原油價格
pub mod oil;

/// 無法取得數據時的顯示字樣
pub const NOT_AVAILABLE: &str = "n/a";

#[async_trait]
pub trait MarketSource: Send + Sync {
    /// 來源名稱，用於記錄
    fn name(&self) -> &'static str;
    /// 顯示的小數位數
    fn decimals(&self) -> u32;
    async fn fetch(&self) -> Result<Decimal, FetchError>;
}

/// 市場數據的顯示內容
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketView {
    /// 一南非幣可兌換的美元
    pub zar_usd: String,
    /// 布蘭特原油每桶美元
    pub brent: String,
}

impl Default for MarketView {
    fn default() -> Self {
        MarketView {
            zar_usd: NOT_AVAILABLE.to_string(),
            brent: NOT_AVAILABLE.to_string(),
        }
    }
}

impl MarketView {
    /// 同時向兩個來源查詢，各自獨立降級
    pub async fn fetch(currency: &dyn MarketSource, oil: &dyn MarketSource) -> Self {
        let (zar_usd, brent) = tokio::join!(display_value(currency), display_value(oil));
        MarketView { zar_usd, brent }
    }
}

async fn display_value(source: &dyn MarketSource) -> String {
    match source.fetch().await {
        Ok(value) => text::format_fixed(value, source.decimals()),
        Err(why) => {
            logging::warn_file_async(format!(
                "Failed to fetch {} because {:?}",
                source.name(),
                why
            ));
            NOT_AVAILABLE.to_string()
        }
    }
}

/// JSON 數字轉成 Decimal，不經過浮點數
pub(crate) fn number_to_decimal(
    number: &serde_json::Number,
    field: &'static str,
) -> Result<Decimal, FetchError> {
    text::parse_decimal(&number.to_string(), None).map_err(|_| FetchError::MissingField(field))
}
