use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}").unwrap();
}

/// TLDs that show up when a filename like `logo@2x.png` matches the email
/// pattern.
const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "tiff", "svg"];

/// Template addresses that never belong to the crawled site.
const PLACEHOLDER_DOMAINS: [&str; 4] = [
    "example.com",
    "domain.com",
    "email.com",
    "yourdomain.com",
];

/// Local-part prefixes treated as evidence of a business contact address.
const PRIORITY_PREFIXES: [&str; 45] = [
    "accounting",
    "accounts",
    "admin",
    "administrator",
    "billing",
    "booking",
    "care",
    "careers",
    "catering",
    "contact",
    "customercare",
    "customerservice",
    "director",
    "enquiries",
    "enquiry",
    "events",
    "feedback",
    "frontdesk",
    "general",
    "hello",
    "help",
    "hi",
    "hr",
    "info",
    "inquiries",
    "inquiry",
    "jobs",
    "mail",
    "management",
    "manager",
    "marketing",
    "media",
    "office",
    "orders",
    "owner",
    "pr",
    "press",
    "reception",
    "recruiting",
    "reservations",
    "sales",
    "service",
    "support",
    "team",
    "welcome",
];

/// Extracts plausible email addresses from arbitrary text, case folded.
///
/// A match touching a word character, dot or hyphen on either side is a
/// fragment of a longer token and is dropped, as are image filenames and
/// placeholder addresses.
pub fn find_emails(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for m in EMAIL_RE.find_iter(text) {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        if !is_boundary(before) || !is_boundary(after) {
            continue;
        }
        let email = m.as_str().to_lowercase();
        if is_plausible(&email) {
            found.push(email);
        }
    }
    found
}

/// Extracts the address from a `mailto:` href, dropping any `?subject=...`
/// tail. A payload that isn't a plausible address is discarded, not an
/// error.
pub fn parse_mailto(href: &str) -> Option<String> {
    // get() instead of slicing: hrefs are arbitrary page content and byte 7
    // may sit inside a multibyte character.
    match href.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("mailto:") => (),
        _ => return None,
    }
    let addr = href[7..].split('?').next().unwrap_or("").trim();
    let m = EMAIL_RE.find(addr)?;
    if m.start() != 0 || m.end() != addr.len() {
        return None;
    }
    let email = addr.to_lowercase();
    is_plausible(&email).then_some(email)
}

/// Deduplicates (case-insensitively) and orders candidates by contact
/// likelihood: addresses with a contact-oriented local part first, then the
/// rest, alphabetical within each group. Total and deterministic.
pub fn rank_emails<I>(emails: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let unique: BTreeSet<String> = emails.into_iter().map(|e| e.to_lowercase()).collect();
    let (mut ranked, mut other): (Vec<_>, Vec<_>) =
        unique.into_iter().partition(|e| has_priority_prefix(e));
    ranked.append(&mut other);
    ranked
}

fn has_priority_prefix(email: &str) -> bool {
    let local = email.split('@').next().unwrap_or(email);
    PRIORITY_PREFIXES.iter().any(|p| local.starts_with(p))
}

fn is_boundary(c: Option<char>) -> bool {
    match c {
        None => true,
        Some(c) => !(c.is_alphanumeric() || c == '_' || c == '.' || c == '-'),
    }
}

fn is_plausible(email: &str) -> bool {
    let domain = match email.rsplit_once('@') {
        Some((_, domain)) => domain,
        None => return false,
    };
    if PLACEHOLDER_DOMAINS.contains(&domain) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((_, tld)) => !IMAGE_EXTENSIONS.contains(&tld),
        None => false,
    }
}
