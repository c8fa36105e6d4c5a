mod email;
mod harvester;
mod scope;

pub use email::{find_emails, parse_mailto, rank_emails};
pub use harvester::{harvest_emails, EmailScraper, EmailScraperConfig};
pub use scope::{registrable_domain, ScopeFilter};
