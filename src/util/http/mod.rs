use std::time::{Duration, Instant};

use once_cell::sync::{Lazy, OnceCell};
use reqwest::{header, Client, Method, Response};
use serde::de::DeserializeOwned;

use crate::{config::SETTINGS, error::FetchError, logging::Logger};

/// A singleton instance of the reqwest client.
static CLIENT: OnceCell<Client> = OnceCell::new();

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP 請求失敗時的最大重試次數。
const MAX_RETRIES: usize = 2;

/// Returns the reqwest client singleton instance or creates one if it doesn't exist.
fn get_client() -> Result<&'static Client, FetchError> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            // ===== 壓縮 =====
            .brotli(true)
            .gzip(true)
            .zstd(true)
            // ===== 超時設置 =====
            .connect_timeout(Duration::from_secs(8))
            .timeout(Duration::from_secs(SETTINGS.http.timeout_secs.max(1)))
            // ===== 連接池 =====
            .tcp_keepalive(Duration::from_secs(60))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|why| FetchError::Transport {
                url: String::new(),
                reason: format!("Failed to create reqwest client: {:?}", why),
            })
    })
}

/// Performs an HTTP GET request and returns the raw body.
///
/// A non-success status code counts as a transport failure.
pub async fn get_bytes(url: &str, headers: Option<header::HeaderMap>) -> Result<Vec<u8>, FetchError> {
    let response = send(Method::GET, url, headers).await?;
    let response = response
        .error_for_status()
        .map_err(|why| FetchError::Transport {
            url: url.to_string(),
            reason: why.to_string(),
        })?;

    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|why| FetchError::Body {
            url: url.to_string(),
            reason: format!("Error reading response body: {:?}", why),
        })
}

/// Performs an HTTP GET request and deserializes the JSON response into the specified type.
///
/// # Type Parameters
///
/// * `RES`: The type to deserialize the JSON response into. It must implement `DeserializeOwned`.
pub async fn get_json<RES: DeserializeOwned>(
    url: &str,
    headers: Option<header::HeaderMap>,
) -> Result<RES, FetchError> {
    let body = get_bytes(url, headers).await?;
    serde_json::from_slice::<RES>(&body).map_err(|why| FetchError::Body {
        url: url.to_string(),
        reason: format!("Error parsing response JSON: {:?}", why),
    })
}

/// Sends an HTTP request with retries on failure.
///
/// This function will attempt to send the request up to MAX_RETRIES times. If a request attempt
/// fails, it logs the error and retries after a delay that doubles with each attempt.
async fn send(
    method: Method,
    url: &str,
    headers: Option<header::HeaderMap>,
) -> Result<Response, FetchError> {
    let visit_log = format!("{method}:{url}");
    let client = get_client()?;
    let mut rb = client.request(method, url);
    let mut last_error = String::new();

    if let Some(h) = headers {
        rb = rb.headers(h);
    }

    for attempt in 1..=MAX_RETRIES {
        let msg = format!("Attempt {} to send {}", attempt, visit_log);
        let rb_clone = rb.try_clone().ok_or_else(|| FetchError::Transport {
            url: url.to_string(),
            reason: "Failed to clone RequestBuilder".to_string(),
        })?;
        let start = Instant::now();
        let res = rb_clone.send().await;
        let elapsed = start.elapsed().as_millis();

        match res {
            Ok(response) => {
                LOGGER.info(format!("{} {} {} ms", msg, response.status(), elapsed));
                return Ok(response);
            }
            Err(why) => {
                last_error = format!("{:?}", why);
                LOGGER.error(format!("{} failed because {:?}. {} ms", msg, why, elapsed));
                if attempt < MAX_RETRIES {
                    tokio::time::sleep(Duration::from_secs(2u64.pow(attempt as u32))).await;
                }
            }
        }
    }

    Err(FetchError::Transport {
        url: url.to_string(),
        reason: format!(
            "failed after {} attempts; last error: {}",
            MAX_RETRIES, last_error
        ),
    })
}
