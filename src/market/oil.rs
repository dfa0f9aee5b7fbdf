use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    config,
    error::FetchError,
    market::{number_to_decimal, MarketSource},
    util::http,
};

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Deserialize, Debug, Default)]
pub struct OilPriceResponse {
    #[serde(default)]
    pub price: Option<serde_json::Number>,
}

impl OilPriceResponse {
    /// 沒有價格或價格為零都視為無資料
    pub fn price(&self) -> Result<Decimal, FetchError> {
        let price = self.price.as_ref().ok_or(FetchError::MissingField("price"))?;
        let price = number_to_decimal(price, "price")?;
        if price.is_zero() {
            return Err(FetchError::MissingField("price"));
        }

        Ok(price)
    }
}

/// 布蘭特原油價格
pub struct OilPrice {
    url: String,
    api_key: String,
}

impl OilPrice {
    pub fn new(url: &str, api_key: &str) -> Self {
        OilPrice {
            url: url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_settings(market: &config::Market) -> Self {
        OilPrice::new(&market.oil_url, &market.oil_api_key)
    }

    fn build_headers(&self) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&self.api_key).map_err(|why| FetchError::Transport {
            url: self.url.clone(),
            reason: format!("invalid api key header: {:?}", why),
        })?;
        headers.insert(API_KEY_HEADER, value);
        Ok(headers)
    }
}

#[async_trait]
impl MarketSource for OilPrice {
    fn name(&self) -> &'static str {
        "brent oil price"
    }

    fn decimals(&self) -> u32 {
        2
    }

    async fn fetch(&self) -> Result<Decimal, FetchError> {
        let headers = self.build_headers()?;
        http::get_json::<OilPriceResponse>(&self.url, Some(headers))
            .await?
            .price()
    }
}
