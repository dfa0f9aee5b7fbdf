//! # 油價資料源解析
//!
//! 把資料源回傳的原始內容轉成依序排列且通過檢核的 [`FuelQuote`]。
//!
//! ## 支援的格式
//!
//! - **逗號分隔文字 (`delimited`)**：第一列為標題，每列至少五欄。
//! - **表格 JSON (`table`)**：外層包著固定長度字串的查詢結果，去掉前後綴後再解碼。
//!
//! 兩種格式都採用同一套檢核：油品與區域不得為空，且目前價格必須是數字。

use crate::{
    config,
    declare::FeedShape,
    error::ParseError,
    store::FuelQuote,
    util::text,
};

/// 逗號分隔文字格式
pub mod delimited;
/// 表格 JSON 格式
pub mod table;

/// 每一列至少要有的欄位數：油品、區域、上期、目前、預測
pub(crate) const MIN_CELLS: usize = 5;

const UTF8_BOM: char = '\u{feff}';

#[derive(Debug, Clone)]
pub struct FeedParser {
    shape: FeedShape,
    prefix_len: usize,
    suffix_len: usize,
    reject_empty: bool,
}

impl FeedParser {
    pub fn new(shape: FeedShape) -> Self {
        FeedParser {
            shape,
            prefix_len: config::DEFAULT_TABLE_PREFIX_LEN,
            suffix_len: config::DEFAULT_TABLE_SUFFIX_LEN,
            reject_empty: false,
        }
    }

    pub fn from_settings(feed: &config::Feed) -> Self {
        FeedParser::new(feed.shape)
            .with_wrapper(feed.prefix_len, feed.suffix_len)
            .reject_empty(feed.reject_empty)
    }

    /// 表格 JSON 前後要去掉的字元數
    pub fn with_wrapper(mut self, prefix_len: usize, suffix_len: usize) -> Self {
        self.prefix_len = prefix_len;
        self.suffix_len = suffix_len;
        self
    }

    /// 沒有任何有效資料列時回傳 [`ParseError::EmptyResult`]
    pub fn reject_empty(mut self, reject: bool) -> Self {
        self.reject_empty = reject;
        self
    }

    pub fn parse(&self, raw: &[u8]) -> Result<Vec<FuelQuote>, ParseError> {
        let text = std::str::from_utf8(raw)?;
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

        let quotes = match self.shape {
            FeedShape::Csv => delimited::parse(text),
            FeedShape::Table => table::parse(text, self.prefix_len, self.suffix_len)?,
        };

        if self.reject_empty && quotes.is_empty() {
            return Err(ParseError::EmptyResult);
        }

        Ok(quotes)
    }
}

/// 依欄位順序建立報價，欄位不足或檢核失敗時回傳 None
pub(crate) fn admit_cells<S: AsRef<str>>(cells: &[Option<S>]) -> Option<FuelQuote> {
    if cells.len() < MIN_CELLS {
        return None;
    }

    let cell = |i: usize| cells[i].as_ref().map(|s| s.as_ref()).unwrap_or("");
    let price = |i: usize| text::parse_decimal(cell(i), None).ok();

    FuelQuote::admit(cell(0), cell(1), price(2), price(3), price(4))
}
