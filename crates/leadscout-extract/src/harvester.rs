use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use url::Url;

use leadscout_crawler::{crawl_site, CrawlerConfig, FrontierTx, Scrapable};

use crate::email;
use crate::scope::ScopeFilter;

lazy_static! {
    static ref ANCHOR_SELECTOR: Selector = Selector::parse("a[href]").unwrap();
}

/// Shared state of one crawl; every worker's scraper instance feeds the
/// same accumulator.
#[derive(Debug, Clone)]
pub struct EmailScraperConfig {
    pub start_url: String,
    pub emails: Arc<Mutex<HashSet<String>>>,
}

impl EmailScraperConfig {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            emails: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

/// Extracts contact addresses from crawled pages and feeds contact-shaped
/// in-scope links back into the frontier.
pub struct EmailScraper {
    scope: ScopeFilter,
    start_url: String,
    emails: Arc<Mutex<HashSet<String>>>,
    tx_url: Option<FrontierTx>,
}

impl Scrapable for EmailScraper {
    type Config = EmailScraperConfig;

    fn new(config: &EmailScraperConfig) -> Result<Self> {
        Ok(Self {
            scope: ScopeFilter::new(&config.start_url)?,
            start_url: config.start_url.clone(),
            emails: config.emails.clone(),
            tx_url: None,
        })
    }

    fn init(&mut self, tx_url: FrontierTx) {
        self.tx_url = Some(tx_url);
    }

    fn seed(&self) -> Vec<String> {
        vec![self.start_url.clone()]
    }

    fn scrap(&mut self, page: String, url: &str) -> Result<()> {
        let doc = Html::parse_document(&page);
        let base = Url::parse(url)?;

        let mut found: Vec<String> = Vec::new();
        let mut links: Vec<String> = Vec::new();

        for anchor in doc.select(&ANCHOR_SELECTOR) {
            let href = match anchor.value().attr("href") {
                Some(href) => href,
                None => continue,
            };
            // mailto addresses are unambiguous, take them first.
            if let Some(email) = email::parse_mailto(href) {
                found.push(email);
                continue;
            }
            match base.join(href) {
                Ok(mut target) => {
                    // Userinfo makes the @ part of the authority, not an
                    // address; such a URL yields neither emails nor links.
                    if !target.username().is_empty() || target.password().is_some() {
                        continue;
                    }
                    found.extend(email::find_emails(href));
                    // Fragments address the same page; keeping them would
                    // dodge the visited set.
                    target.set_fragment(None);
                    let target = target.to_string();
                    if self.scope.accept(&target) {
                        links.push(target);
                    }
                }
                Err(_) => found.extend(email::find_emails(href)),
            }
        }

        let text = doc.root_element().text().collect::<Vec<_>>().join(" ");
        found.extend(email::find_emails(&text));

        if !found.is_empty() {
            let mut emails = self.emails.lock().unwrap();
            for email in found {
                if emails.insert(email.clone()) {
                    log::info!("Found {email} on {url}");
                }
            }
        }

        if let Some(tx_url) = &self.tx_url {
            for link in links {
                tx_url.send(&link);
            }
        }

        Ok(())
    }

    fn finalizer(&mut self) {
        log::debug!(
            "Crawl of {} done, {} unique addresses",
            self.scope.scope(),
            self.emails.lock().unwrap().len()
        );
    }
}

/// Crawls the site of `start_url` and returns its ranked contact addresses.
pub async fn harvest_emails(start_url: &str, crawler_conf: &CrawlerConfig) -> Result<Vec<String>> {
    let conf = EmailScraperConfig::new(start_url);
    crawl_site::<EmailScraper>(crawler_conf, &conf).await?;
    let emails: Vec<String> = conf.emails.lock().unwrap().iter().cloned().collect();
    Ok(email::rank_emails(emails))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrap_one(page: &str, url: &str) -> (HashSet<String>, EmailScraperConfig) {
        let conf = EmailScraperConfig::new(url);
        let mut scraper = EmailScraper::new(&conf).unwrap();
        scraper.scrap(page.to_string(), url).unwrap();
        let emails = conf.emails.lock().unwrap().clone();
        (emails, conf)
    }

    #[test]
    fn mailto_and_text_occurrence_yield_one_entry() {
        let page = r#"<html><body>
            <a href="mailto:info@x.com">write us</a>
            <p>Questions? info@x.com anytime</p>
        </body></html>"#;
        let (emails, _) = scrap_one(page, "https://x.com/");
        assert_eq!(emails.len(), 1);
        assert!(emails.contains("info@x.com"));
    }

    #[test]
    fn image_lookalikes_never_reach_the_accumulator() {
        let page = r#"<html><body><img src="logo@2x.png"> logo@2x.png</body></html>"#;
        let (emails, _) = scrap_one(page, "https://x.com/");
        assert!(emails.is_empty());
    }

    #[test]
    fn userinfo_urls_are_not_mined_for_emails() {
        let page = r#"<html><body>
            <a href="https://info@x.com/about">obfuscated</a>
        </body></html>"#;
        let (emails, _) = scrap_one(page, "https://x.com/");
        assert!(emails.is_empty());
    }

    #[test]
    fn emails_in_hrefs_are_collected() {
        let page = r#"<html><body>
            <a href="https://x.com/about?reply=sales@x.com">about</a>
        </body></html>"#;
        let (emails, _) = scrap_one(page, "https://x.com/");
        assert!(emails.contains("sales@x.com"));
    }
}
