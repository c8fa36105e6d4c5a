use std::cmp;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_page_buffer")]
    pub page_buffer: usize,

    /// Maximum number of in-flight page downloads.
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,

    /// Number of threads parsing downloaded pages.
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    #[serde(default = "default_throttle")]
    pub throttle: Option<Throttle>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: f32,

    /// Hard ceiling on the number of URLs enqueued per crawl.
    #[serde(default = "default_max_pages")]
    pub max_pages: Option<usize>,

    /// Overall crawl deadline in seconds; the crawl stops cleanly with
    /// whatever it accumulated so far.
    #[serde(default = "default_crawl_timeout")]
    pub crawl_timeout: Option<f32>,

    #[serde(default = "default_on_dl_error")]
    pub on_dl_error: OnError,

    #[serde(default = "default_on_scrap_error")]
    pub on_scrap_error: OnError,

    #[serde(default = "default_handle_sigint")]
    pub handle_sigint: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            page_buffer: default_page_buffer(),
            concurrent_downloads: default_concurrent_downloads(),
            num_workers: default_num_workers(),
            throttle: default_throttle(),
            request_timeout: default_request_timeout(),
            max_pages: default_max_pages(),
            crawl_timeout: default_crawl_timeout(),
            on_dl_error: default_on_dl_error(),
            on_scrap_error: default_on_scrap_error(),
            handle_sigint: default_handle_sigint(),
        }
    }
}

fn default_user_agent() -> String {
    String::from("leadscout/0.1")
}

fn default_page_buffer() -> usize {
    256
}

fn default_concurrent_downloads() -> usize {
    10
}

fn default_num_workers() -> usize {
    cmp::max(1, num_cpus::get().saturating_sub(2))
}

fn default_throttle() -> Option<Throttle> {
    Some(Throttle::Delay(0.5))
}

fn default_request_timeout() -> f32 {
    10.0
}

fn default_max_pages() -> Option<usize> {
    Some(100)
}

fn default_crawl_timeout() -> Option<f32> {
    Some(60.0)
}

fn default_on_dl_error() -> OnError {
    OnError::SkipAndLog
}

fn default_on_scrap_error() -> OnError {
    OnError::SkipAndLog
}

fn default_handle_sigint() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OnError {
    Fail,
    SkipAndLog,
}

/// Spacing of outbound requests, enforced across all download slots
/// combined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Throttle {
    /// The number of requests per second
    PerSecond(NonZeroU32),
    /// The delay in seconds between requests
    Delay(f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sane_defaults() {
        let conf = CrawlerConfig::default();
        assert_eq!(conf.concurrent_downloads, 10);
        assert!(conf.num_workers >= 1);
        assert!(conf.max_pages.is_some());
        assert!(conf.crawl_timeout.is_some());
        assert!(matches!(conf.on_dl_error, OnError::SkipAndLog));
    }

    #[test]
    fn config_from_json_with_partial_fields() {
        let conf: CrawlerConfig =
            serde_json::from_str(r#"{"userAgent": "test-bot", "maxPages": 5}"#).unwrap();
        assert_eq!(conf.user_agent, "test-bot");
        assert_eq!(conf.max_pages, Some(5));
        assert_eq!(conf.concurrent_downloads, 10);
    }
}
