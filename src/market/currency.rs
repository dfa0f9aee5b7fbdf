use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    config,
    error::FetchError,
    market::{number_to_decimal, MarketSource},
    util::http,
};

const SYMBOL: &str = "ZAR";

#[derive(Deserialize, Debug, Default)]
pub struct RateResponse {
    #[serde(default)]
    pub rates: HashMap<String, serde_json::Number>,
}

impl RateResponse {
    /// 回傳的是一美元兌換的南非幣，顯示時取倒數
    pub fn usd_per_zar(&self) -> Result<Decimal, FetchError> {
        let rate = self
            .rates
            .get(SYMBOL)
            .ok_or(FetchError::MissingField("rates.ZAR"))?;
        let rate = number_to_decimal(rate, "rates.ZAR")?;

        Decimal::ONE
            .checked_div(rate)
            .ok_or(FetchError::MissingField("rates.ZAR"))
    }
}

/// 美元兌南非幣匯率
pub struct CurrencyRate {
    url: String,
}

impl CurrencyRate {
    pub fn new(url: &str) -> Self {
        CurrencyRate {
            url: url.to_string(),
        }
    }

    pub fn from_settings(market: &config::Market) -> Self {
        CurrencyRate::new(&market.currency_url)
    }
}

#[async_trait]
impl MarketSource for CurrencyRate {
    fn name(&self) -> &'static str {
        "currency rate"
    }

    fn decimals(&self) -> u32 {
        3
    }

    async fn fetch(&self) -> Result<Decimal, FetchError> {
        http::get_json::<RateResponse>(&self.url, None)
            .await?
            .usd_per_zar()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::util::text;

    use super::*;

    #[test]
    fn test_usd_per_zar() {
        let res: RateResponse =
            serde_json::from_str(r#"{"base":"USD","rates":{"ZAR":18.5}}"#).unwrap();
        let value = res.usd_per_zar().unwrap();
        assert_eq!(text::format_fixed(value, 3), "0.054");
    }

    #[test]
    fn test_missing_or_zero_rate() {
        let res: RateResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(matches!(res.usd_per_zar(), Err(FetchError::MissingField(_))));

        let res: RateResponse = serde_json::from_str(r#"{"rates":{"EUR":0.9}}"#).unwrap();
        assert!(res.usd_per_zar().is_err());

        let res: RateResponse = serde_json::from_str(r#"{"rates":{"ZAR":0}}"#).unwrap();
        assert!(res.usd_per_zar().is_err());
    }

    #[test]
    fn test_exact_reciprocal() {
        let res: RateResponse = serde_json::from_str(r#"{"rates":{"ZAR":20}}"#).unwrap();
        assert_eq!(res.usd_per_zar().unwrap(), dec!(0.05));
    }
}
