use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

use leadscout_crawler::CrawlerConfig;
use leadscout_extract::harvest_emails;

type Hits = Arc<Mutex<HashMap<String, usize>>>;

/// Minimal HTTP server backed by a path -> body map, counting requests per
/// path. Unknown paths get a 404.
fn serve(pages: HashMap<&'static str, String>) -> (String, Hits) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let hits: Hits = Arc::new(Mutex::new(HashMap::new()));

    let hits_c = hits.clone();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = match stream {
                Ok(stream) => stream,
                Err(_) => break,
            };
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).unwrap_or(0);
            let req = String::from_utf8_lossy(&buf[..n]);
            let path = req.split_whitespace().nth(1).unwrap_or("/").to_string();
            *hits_c.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

            let resp = match pages.get(path.as_str()) {
                Some(body) => format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                ),
                None => String::from(
                    "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                ),
            };
            stream.write_all(resp.as_bytes()).ok();
        }
    });

    (format!("http://{addr}"), hits)
}

fn test_conf() -> CrawlerConfig {
    CrawlerConfig {
        num_workers: 2,
        concurrent_downloads: 2,
        throttle: None,
        handle_sigint: false,
        request_timeout: 5.0,
        max_pages: Some(10),
        crawl_timeout: Some(30.0),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn crawl_stays_in_scope_and_ranks_emails() {
    let mut pages = HashMap::new();
    // The landing page links to a contact-shaped page (followed), a product
    // page (no keyword, dropped), an external platform (dropped), and holds
    // one address in a mailto plus an image lookalike.
    pages.insert(
        "/",
        r##"<html><body>
            <a href="/about">About us</a>
            <a href="/about#hours">Opening hours</a>
            <a href="/menu/item42">Daily special</a>
            <a href="https://facebook.com/acmebistro">Facebook</a>
            <a href="mailto:Hello@AcmeBistro.com?subject=Hi">write us</a>
            <img src="logo@2x.png">
        </body></html>"##
            .to_string(),
    );
    pages.insert(
        "/about",
        r##"<html><body>
            <p>Bookings: info@acmebistro.com</p>
            <p>Run by aaron@acmebistro.com</p>
            <a href="/">Home</a>
        </body></html>"##
            .to_string(),
    );

    let (base, hits) = serve(pages);
    let emails = harvest_emails(&base, &test_conf()).await.unwrap();

    // Priority prefixes first, alphabetical within groups, case folded.
    assert_eq!(
        emails,
        vec![
            "hello@acmebistro.com",
            "info@acmebistro.com",
            "aaron@acmebistro.com"
        ]
    );

    let hits = hits.lock().unwrap();
    // The about page was discovered twice (plain link + fragment link) but
    // fetched exactly once; the product page was never fetched.
    assert_eq!(hits.get("/"), Some(&1));
    assert_eq!(hits.get("/about"), Some(&1));
    assert_eq!(hits.get("/menu/item42"), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn site_without_emails_yields_empty_ranking() {
    let mut pages = HashMap::new();
    pages.insert(
        "/",
        "<html><body><a href=\"/contact\">contact</a></body></html>".to_string(),
    );
    // /contact intentionally missing: the 404 is skipped, not fatal.

    let (base, _hits) = serve(pages);
    let emails = harvest_emails(&base, &test_conf()).await.unwrap();
    assert!(emails.is_empty());
}
