mod config;
mod crawler;
mod fetch;
mod limiter;
mod scrapable;

pub use config::{CrawlerConfig, OnError, Throttle};
pub use crawler::crawl_site;
pub use limiter::RateLimiter;
pub use scrapable::{FrontierTx, Scrapable};

pub use anyhow;
