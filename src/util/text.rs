use std::{collections::HashSet, str::FromStr};

use anyhow::{anyhow, Result};
use rust_decimal::{Decimal, RoundingStrategy};

/// 數值欄位在解析前要從頭尾移除的字元
const NUMBER_ESCAPE_CHAR: &[char] = &['"', ' ', '\t', '\r', '\n'];

/// 無資料時的顯示字樣
pub const PLACEHOLDER: &str = "--";

/// Parses a `Decimal` value from a feed cell.
///
/// Plain decimal notation is tried first, then scientific notation (`1.85e1`).
/// Only `.` is accepted as the decimal separator.
///
/// # Arguments
///
/// * `s`: The raw cell text.
/// * `escape_chars`: Additional characters to be removed before parsing.
///
/// # Example
///
/// ```
/// let price = parse_decimal(" 18.50\r", None).unwrap();
/// ```
pub fn parse_decimal(s: &str, escape_chars: Option<Vec<char>>) -> Result<Decimal> {
    let cleaned = clean_escape_chars(s, escape_chars);
    if cleaned.is_empty() {
        return Err(anyhow!("Failed to parse an empty cell as Decimal"));
    }

    // 中間夾雜空白或 `_` 分隔符號的內容不是合法數值
    if cleaned.chars().any(|c| c == '_' || c.is_whitespace()) {
        return Err(anyhow!("Failed to parse '{}' as Decimal", cleaned));
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|why| anyhow!("Failed to parse '{}' as Decimal because {:?}", cleaned, why))
}

/// Trims a set of escape characters from both ends of a given string.
pub(crate) fn clean_escape_chars(s: &str, escape_chars: Option<Vec<char>>) -> String {
    let mut combined: Vec<char> = NUMBER_ESCAPE_CHAR.to_vec();
    if let Some(ec) = escape_chars {
        combined.extend(ec);
    }

    let filters = combined.iter().collect::<HashSet<_>>();
    s.trim_matches(|c: char| filters.contains(&c)).to_string()
}

/// 四捨五入(遠離零)到指定位數後補零，例︰18.5 => "18.50"
pub fn format_fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

/// 有值時格式化，無值時回傳 [`PLACEHOLDER`]
pub fn format_or_placeholder(value: Option<Decimal>, dp: u32) -> String {
    value
        .map(|v| format_fixed(v, dp))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
