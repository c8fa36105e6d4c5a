use anyhow::anyhow;
use url::Url;

/// Large platforms that never host a business's own contact page.
const EXCLUDED_DOMAINS: [&str; 20] = [
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "linkedin.com",
    "youtube.com",
    "pinterest.com",
    "tiktok.com",
    "snapchat.com",
    "google.com",
    "bing.com",
    "yahoo.com",
    "duckduckgo.com",
    "yelp.com",
    "tripadvisor.com",
    "foursquare.com",
    "doordash.com",
    "grubhub.com",
    "ubereats.com",
    "bit.ly",
    "tinyurl.com",
];

/// URL substrings marking contact/about-shaped pages. This gate is what
/// keeps a crawl shallow: product catalogs are not traversed, only the
/// pages likely to publish an address.
const FOLLOW_KEYWORDS: [&str; 18] = [
    "contact",
    "about",
    "staff",
    "team",
    "info",
    "support",
    "help",
    "home",
    "location",
    "people",
    "jobs",
    "careers",
    "faq",
    "visit",
    "connect",
    "reach",
    "find-us",
    "imprint",
];

/// Multi-label public suffixes, enough to compute registrable domains for
/// common business sites without shipping the full public suffix list.
const MULTI_LABEL_SUFFIXES: [&str; 16] = [
    "co.uk",
    "org.uk",
    "ac.uk",
    "gov.uk",
    "com.au",
    "net.au",
    "org.au",
    "co.nz",
    "co.jp",
    "co.in",
    "co.za",
    "com.br",
    "com.mx",
    "com.sg",
    "com.hk",
    "com.tr",
];

/// Collapses a hostname to its registrable domain, so `www.example.com` and
/// `example.com` are the same site. IP addresses are returned unchanged.
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    if host.parse::<std::net::IpAddr>().is_ok() {
        return host;
    }
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host;
    }
    let suffix = labels[labels.len() - 2..].join(".");
    let take = if MULTI_LABEL_SUFFIXES.contains(&suffix.as_str()) {
        3
    } else {
        2
    };
    labels[labels.len() - take..].join(".")
}

/// Decides which discovered links stay inside a crawl.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    scope: String,
}

impl ScopeFilter {
    /// Builds a filter confined to the registrable domain of `start_url`.
    pub fn new(start_url: &str) -> anyhow::Result<Self> {
        let url = Url::parse(start_url)?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow!("No host in {start_url}"))?;
        Ok(Self {
            scope: registrable_domain(host),
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns whether an absolute URL should be followed: parseable, http(s),
    /// no userinfo in the authority, same registrable domain, not an excluded
    /// platform, and shaped like a contact/about page.
    pub fn accept(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        // Userinfo in the authority is an obfuscated address, not a page.
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return false;
        }
        let host = match parsed.host_str() {
            Some(host) => host,
            None => return false,
        };
        let domain = registrable_domain(host);
        if domain != self.scope {
            return false;
        }
        if EXCLUDED_DOMAINS.contains(&domain.as_str()) {
            return false;
        }
        let lower = url.to_lowercase();
        FOLLOW_KEYWORDS.iter().any(|kw| lower.contains(kw))
    }
}
