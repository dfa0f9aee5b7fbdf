use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// 資料源格式
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum FeedShape {
    /// 逗號分隔的文字表格，第一列為標題
    #[default]
    #[strum(serialize = "csv")]
    Csv,
    /// 外層包著固定長度字串的表格 JSON
    #[strum(serialize = "table")]
    Table,
}

/// 預測價格相對於目前價格的走勢
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, AsRefStr, Display)]
#[serde(rename_all = "kebab-case")]
pub enum Trend {
    /// 預測價格下跌 -1
    #[strum(serialize = "down-good")]
    DownGood,
    /// 預測價格上漲 1
    #[strum(serialize = "up-bad")]
    UpBad,
    /// 持平 0
    #[strum(serialize = "flat")]
    Flat,
    /// 無資料
    #[serde(rename = "--")]
    #[strum(serialize = "--")]
    Neutral,
}

impl Trend {
    pub fn from_delta(delta: Decimal) -> Self {
        match delta.cmp(&Decimal::ZERO) {
            Ordering::Less => Trend::DownGood,
            Ordering::Greater => Trend::UpBad,
            Ordering::Equal => Trend::Flat,
        }
    }

    /// 畫面上顯示的箭頭
    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::DownGood => "🟢⬇",
            Trend::UpBad => "🔴⬆",
            Trend::Flat => "➖",
            Trend::Neutral => "--",
        }
    }
}
