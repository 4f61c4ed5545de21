//! HTTP fetcher
//!
//! Fetches one page as HTML text: a HEAD probe checks the Content-Type
//! before the body is pulled with GET. Transient network failures (transport
//! errors, non-success statuses) are retried a bounded number of times with
//! a fixed delay; a non-HTML Content-Type is permanent for that URL and
//! never retried.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the fetch collaborator
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure or non-success HTTP status; transient, retried
    #[error("network error for {url}: {reason}")]
    Network { url: String, reason: String },

    /// The URL does not serve an HTML document; permanent, never retried
    #[error("{url} is not an HTML document (content-type: {content_type:?})")]
    ContentType { url: String, content_type: String },
}

/// Retry policy for transient fetch failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Number of retries after the first failed attempt
    pub max_retries: u32,

    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Builds the HTTP client used for the whole crawl
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches the HTML text of a page, retrying transient failures
///
/// Network errors are retried up to `retry.max_retries` times with the
/// policy's fixed delay between attempts, so a URL is tried at most
/// `max_retries + 1` times before the error propagates. Content-Type
/// mismatches propagate immediately.
pub async fn fetch_html(
    client: &Client,
    url: &str,
    retry: &RetryPolicy,
) -> Result<String, FetchError> {
    let mut attempts: u32 = 0;
    loop {
        match try_fetch(client, url).await {
            Ok(body) => return Ok(body),
            Err(err @ FetchError::ContentType { .. }) => return Err(err),
            Err(err) => {
                attempts += 1;
                if attempts > retry.max_retries {
                    return Err(err);
                }
                tracing::debug!(
                    "Fetch attempt {} for {} failed ({}), retrying in {:?}",
                    attempts,
                    url,
                    err,
                    retry.delay
                );
                tokio::time::sleep(retry.delay).await;
            }
        }
    }
}

/// One fetch attempt: HEAD content-type probe, then GET
async fn try_fetch(client: &Client, url: &str) -> Result<String, FetchError> {
    let head = client
        .head(url)
        .send()
        .await
        .map_err(|e| network_error(url, &e))?;

    if !head.status().is_success() {
        return Err(FetchError::Network {
            url: url.to_string(),
            reason: format!("HTTP {}", head.status()),
        });
    }

    let content_type = head
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.starts_with("text/html") {
        return Err(FetchError::ContentType {
            url: url.to_string(),
            content_type,
        });
    }

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| network_error(url, &e))?;

    if !response.status().is_success() {
        return Err(FetchError::Network {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    response.text().await.map_err(|e| network_error(url, &e))
}

fn network_error(url: &str, err: &reqwest::Error) -> FetchError {
    let reason = if err.is_timeout() {
        "request timeout".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        err.to_string()
    };

    FetchError::Network {
        url: url.to_string(),
        reason,
    }
}
