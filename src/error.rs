//! 錯誤型別
//!
//! 抓取、解析與刷新流程各自有獨立的錯誤列舉，
//! 篩選條件查無資料或屬於排除組合並不是錯誤，而是 [`crate::display::ViewModel`] 的狀態。

use thiserror::Error;

/// 網路層的失敗
#[derive(Error, Debug)]
pub enum FetchError {
    /// 連線、逾時或 HTTP 狀態碼錯誤
    #[error("transport error while fetching {url}: {reason}")]
    Transport { url: String, reason: String },

    /// 回應內容無法解碼成預期的 JSON
    #[error("unexpected response body from {url}: {reason}")]
    Body { url: String, reason: String },

    /// 回應缺少需要的欄位
    #[error("{0} is missing from the response")]
    MissingField(&'static str),
}

/// 資料源內容的解析失敗
#[derive(Error, Debug)]
pub enum ParseError {
    /// 內容無法轉換成資料列
    #[error("feed payload is unreadable: {0}")]
    Unreadable(String),

    /// 沒有任何一列通過檢核（只有在 reject_empty 開啟時才會回傳）
    #[error("feed payload contains no admissible rows")]
    EmptyResult,
}

impl From<std::str::Utf8Error> for ParseError {
    fn from(err: std::str::Utf8Error) -> Self {
        ParseError::Unreadable(err.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Unreadable(err.to_string())
    }
}

/// 主要刷新流程的失敗
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
