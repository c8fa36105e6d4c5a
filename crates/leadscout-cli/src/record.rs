use serde::{Deserialize, Serialize};

/// Sentinel written at the export boundary for fields the upstream API or
/// the crawl couldn't provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// One business, as persisted in the cache and exported to CSV.
///
/// Missing upstream fields stay `None` in memory and on disk; they only
/// become the `N/A` sentinel when a CSV row is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub hours: Option<String>,
    /// Ranked, de-duplicated contact addresses found on the website.
    #[serde(default)]
    pub emails: Vec<String>,
}

impl PlaceRecord {
    /// Export form of the email list: priority order, semicolon-joined.
    pub fn joined_emails(&self) -> String {
        if self.emails.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            self.emails.join(";")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_join_with_semicolons_or_na() {
        let mut record = PlaceRecord::default();
        assert_eq!(record.joined_emails(), "N/A");
        record.emails = vec!["info@x.com".into(), "sales@x.com".into()];
        assert_eq!(record.joined_emails(), "info@x.com;sales@x.com");
    }
}
