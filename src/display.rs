//! 依目前的篩選條件把報價轉成畫面要顯示的內容。
//!
//! [`DisplayProjector::render`] 不做任何 I/O 也不讀時間，相同的輸入永遠得到相同的 [`ViewModel`]；
//! 顯示時間由呼叫端放進 [`Frame`]。

use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    config::{self, Exclusion},
    declare::Trend,
    store::{FuelQuote, QuoteSnapshot},
    util::text::{self, PLACEHOLDER},
};

/// 價格顯示的小數位數
const PRICE_DP: u32 = 2;
/// 漲跌顯示的小數位數
const DELTA_DP: u32 = 3;

/// 使用者目前選取的油品與區域
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub fuel_type: String,
    pub region: String,
}

impl FilterState {
    pub fn new(fuel_type: &str, region: &str) -> Self {
        FilterState {
            fuel_type: fuel_type.trim().to_string(),
            region: region.trim().to_string(),
        }
    }

    /// 兩個條件都已選取
    pub fn is_complete(&self) -> bool {
        !self.fuel_type.is_empty() && !self.region.is_empty()
    }
}

/// 走勢圖的三個點：上期、目前、預測
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendSeries {
    pub labels: [&'static str; 3],
    pub label: &'static str,
    pub values: [Decimal; 3],
}

impl TrendSeries {
    fn from_quote(quote: &FuelQuote) -> Option<Self> {
        Some(TrendSeries {
            labels: ["Previous", "Current", "Predicted"],
            label: "Fuel Price",
            values: [
                quote.previous_price?,
                quote.current_price,
                quote.predicted_price?,
            ],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub previous: String,
    pub current: String,
    pub predicted: String,
    pub delta: String,
    pub trend: Trend,
    pub warning: Option<String>,
    /// 是否有對應到報價
    pub valid: bool,
    pub series: Option<TrendSeries>,
}

impl ViewModel {
    /// 未選取或查無資料時的顯示內容
    pub fn placeholder() -> Self {
        ViewModel {
            previous: PLACEHOLDER.to_string(),
            current: PLACEHOLDER.to_string(),
            predicted: PLACEHOLDER.to_string(),
            delta: PLACEHOLDER.to_string(),
            trend: Trend::Neutral,
            warning: None,
            valid: false,
            series: None,
        }
    }

    fn with_warning(warning: String) -> Self {
        ViewModel {
            warning: Some(warning),
            ..ViewModel::placeholder()
        }
    }

    /// 由單筆報價計算，漲跌 = 預測 - 目前，溢位時視同無資料
    pub fn from_quote(quote: &FuelQuote) -> Self {
        let delta = quote
            .predicted_price
            .and_then(|p| p.checked_sub(quote.current_price));

        ViewModel {
            previous: text::format_or_placeholder(quote.previous_price, PRICE_DP),
            current: text::format_fixed(quote.current_price, PRICE_DP),
            predicted: text::format_or_placeholder(quote.predicted_price, PRICE_DP),
            delta: text::format_or_placeholder(delta, DELTA_DP),
            trend: delta.map(Trend::from_delta).unwrap_or(Trend::Neutral),
            warning: None,
            valid: true,
            series: TrendSeries::from_quote(quote),
        }
    }
}

/// 一次畫面更新的內容
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub view: ViewModel,
    pub rendered_at: DateTime<Local>,
}

#[derive(Debug, Clone, Default)]
pub struct DisplayProjector {
    exclusions: Vec<Exclusion>,
}

impl DisplayProjector {
    pub fn new(exclusions: Vec<Exclusion>) -> Self {
        DisplayProjector { exclusions }
    }

    pub fn from_settings(display: &config::Display) -> Self {
        DisplayProjector::new(display.exclusions.clone())
    }

    /// 篩選條件屬於排除組合時回傳提示訊息
    pub fn excluded(&self, filter: &FilterState) -> Option<String> {
        self.exclusions
            .iter()
            .find(|e| {
                e.fuel_type.trim().eq_ignore_ascii_case(filter.fuel_type.trim())
                    && e.region.trim().eq_ignore_ascii_case(filter.region.trim())
            })
            .map(|e| {
                format!(
                    "{} is not sold in {} regions",
                    e.fuel_type.trim(),
                    e.region.trim()
                )
            })
    }

    pub fn render(&self, snapshot: &QuoteSnapshot, filter: &FilterState) -> ViewModel {
        if !filter.is_complete() {
            return ViewModel::placeholder();
        }

        if let Some(warning) = self.excluded(filter) {
            return ViewModel::with_warning(warning);
        }

        snapshot
            .find(&filter.fuel_type, &filter.region)
            .map(ViewModel::from_quote)
            .unwrap_or_else(ViewModel::placeholder)
    }
}
