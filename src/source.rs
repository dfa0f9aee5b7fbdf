use async_trait::async_trait;

use crate::{config, error::FetchError, util::http};

/// 油價資料源
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}

/// 以 HTTP GET 取得的資料源
pub struct HttpFeed {
    url: String,
}

impl HttpFeed {
    pub fn new(url: &str) -> Self {
        HttpFeed {
            url: url.to_string(),
        }
    }

    pub fn from_settings(feed: &config::Feed) -> Self {
        HttpFeed::new(&feed.url)
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        http::get_bytes(&self.url, None).await
    }
}
