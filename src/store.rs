//! 油價資料的快取。
//!
//! [`QuoteStore`] 只保存「最新一次完整抓取」的結果，每次刷新整份替換，
//! 讀取端拿到的是 `Arc<QuoteSnapshot>`，永遠不會看到一半新一半舊的資料。

use std::{
    collections::HashSet,
    sync::{Arc, RwLock},
};

use rust_decimal::Decimal;
use serde::Serialize;

/// 單一油品在單一區域的報價
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuelQuote {
    pub fuel_type: String,
    pub region: String,
    /// 上期價格，無法解析時為 None
    pub previous_price: Option<Decimal>,
    /// 目前價格
    pub current_price: Decimal,
    /// 預測價格，無法解析時為 None
    pub predicted_price: Option<Decimal>,
}

impl FuelQuote {
    /// 依檢核規則建立報價：油品與區域去除空白後不得為空
    pub fn admit(
        fuel_type: &str,
        region: &str,
        previous_price: Option<Decimal>,
        current_price: Option<Decimal>,
        predicted_price: Option<Decimal>,
    ) -> Option<Self> {
        let fuel_type = fuel_type.trim();
        let region = region.trim();
        if fuel_type.is_empty() || region.is_empty() {
            return None;
        }

        Some(FuelQuote {
            fuel_type: fuel_type.to_string(),
            region: region.to_string(),
            previous_price,
            current_price: current_price?,
            predicted_price,
        })
    }

    pub fn matches(&self, fuel_type: &str, region: &str) -> bool {
        self.fuel_type == fuel_type && self.region == region
    }
}

/// 某一次抓取的完整結果，建立後不再變動
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QuoteSnapshot {
    quotes: Vec<FuelQuote>,
}

impl QuoteSnapshot {
    pub fn new(quotes: Vec<FuelQuote>) -> Self {
        QuoteSnapshot { quotes }
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// 依資料順序回傳第一筆符合的報價
    pub fn find(&self, fuel_type: &str, region: &str) -> Option<&FuelQuote> {
        self.quotes.iter().find(|q| q.matches(fuel_type, region))
    }

    /// 不重複的油品，保留第一次出現的順序
    pub fn distinct_fuel_types(&self) -> Vec<String> {
        distinct(self.quotes.iter().map(|q| q.fuel_type.as_str()))
    }

    /// 不重複的區域，保留第一次出現的順序
    pub fn distinct_regions(&self) -> Vec<String> {
        distinct(self.quotes.iter().map(|q| q.region.as_str()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// 目前顯示中的報價集合
#[derive(Debug, Default)]
pub struct QuoteStore {
    current: RwLock<Arc<QuoteSnapshot>>,
}

impl QuoteStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// 以新的完整資料替換掉舊資料
    pub fn replace(&self, quotes: Vec<FuelQuote>) {
        let next = Arc::new(QuoteSnapshot::new(quotes));
        match self.current.write() {
            Ok(mut current) => *current = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// 取得目前這一份資料
    pub fn snapshot(&self) -> Arc<QuoteSnapshot> {
        match self.current.read() {
            Ok(current) => Arc::clone(&current),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn find(&self, fuel_type: &str, region: &str) -> Option<FuelQuote> {
        self.snapshot().find(fuel_type, region).cloned()
    }

    pub fn distinct_fuel_types(&self) -> Vec<String> {
        self.snapshot().distinct_fuel_types()
    }

    pub fn distinct_regions(&self) -> Vec<String> {
        self.snapshot().distinct_regions()
    }
}
