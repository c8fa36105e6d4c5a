use std::time::Duration;

use anyhow::Result;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::config::CrawlerConfig;
use crate::limiter::RateLimiter;

pub(crate) fn build_client(conf: &CrawlerConfig) -> Result<reqwest::Client> {
    Ok(reqwest::ClientBuilder::new()
        .user_agent(&conf.user_agent)
        .gzip(true)
        .deflate(true)
        .timeout(Duration::from_secs_f32(conf.request_timeout))
        .build()?)
}

/// Downloads a single page, honoring the rate limiter.
///
/// `Ok(None)` means the URL yielded no crawlable content: a non-200 status
/// or a non-HTML payload. Transport failures surface as `Err` and are dealt
/// with by the caller's `OnError` policy.
pub(crate) async fn fetch_page(
    client: &reqwest::Client,
    limiter: Option<&RateLimiter>,
    url: &str,
) -> Result<Option<String>> {
    if let Some(limiter) = limiter {
        limiter.acquire().await;
    }
    let resp = client.get(url).send().await?;
    if resp.status() != StatusCode::OK {
        log::debug!("Skipping {url}: status {}", resp.status());
        return Ok(None);
    }
    let html = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|c| c.to_str().ok())
        .map(|c| c.to_ascii_lowercase().contains("text/html"))
        .unwrap_or(false);
    if !html {
        log::debug!("Skipping {url}: not text/html");
        return Ok(None);
    }
    Ok(Some(resp.text().await?))
}
