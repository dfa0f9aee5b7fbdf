use serde::Deserialize;
use serde_json::Value;

use crate::{error::ParseError, feed::admit_cells, store::FuelQuote};

#[derive(Deserialize, Debug)]
struct QueryResponse {
    table: Table,
}

/// 查詢結果中的表格
#[derive(Deserialize, Debug, Default)]
pub struct Table {
    pub rows: Vec<Row>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Row {
    /// 欄位可能整個是 null
    #[serde(default)]
    pub c: Vec<Option<Cell>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Cell {
    #[serde(default)]
    pub v: Option<Value>,
}

impl Cell {
    fn text(&self) -> Option<String> {
        match self.v.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// 去掉外層固定長度的前後綴，以字元計算
pub fn unwrap_payload(text: &str, prefix_len: usize, suffix_len: usize) -> Result<&str, ParseError> {
    let total = text.chars().count();
    if total < prefix_len + suffix_len {
        return Err(ParseError::Unreadable(format!(
            "payload has {} chars, shorter than the {}+{} char wrapper",
            total, prefix_len, suffix_len
        )));
    }

    let start = byte_offset(text, prefix_len);
    let end = byte_offset(text, total - suffix_len);
    Ok(&text[start..end])
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// 解析外層包著前後綴的表格 JSON
pub fn parse(text: &str, prefix_len: usize, suffix_len: usize) -> Result<Vec<FuelQuote>, ParseError> {
    let json = unwrap_payload(text, prefix_len, suffix_len)?;
    let response = serde_json::from_str::<QueryResponse>(json)?;
    Ok(parse_table(&response.table))
}

/// 已解碼的表格轉成報價
pub fn parse_table(table: &Table) -> Vec<FuelQuote> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let cells: Vec<Option<String>> = row
                .c
                .iter()
                .map(|cell| cell.as_ref().and_then(Cell::text))
                .collect();
            admit_cells(&cells)
        })
        .collect()
}
