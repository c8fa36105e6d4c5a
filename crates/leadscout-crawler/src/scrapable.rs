use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

/// Scraping logic plugged into [`crawl_site`](crate::crawl_site).
///
/// One instance is created per worker thread, so shared output state belongs
/// in the `Config`.
pub trait Scrapable {
    type Config: Clone + Send + 'static;

    fn new(config: &Self::Config) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Called once per worker with the handle used to feed discovered URLs
    /// back into the frontier.
    fn init(&mut self, _tx_url: FrontierTx) {}

    /// URLs seeding the frontier.
    fn seed(&self) -> Vec<String>;

    fn scrap(&mut self, page: String, url: &str) -> anyhow::Result<()>;

    fn finalizer(&mut self) {}
}

/// Write side of the frontier.
///
/// Performs the seen-set check atomically with the enqueue decision, so a
/// URL discovered concurrently from several pages is enqueued at most once,
/// and enforces the per-crawl page cap.
#[derive(Debug, Clone)]
pub struct FrontierTx {
    tx: mpsc::UnboundedSender<String>,
    pending: Arc<AtomicUsize>,
    seen: Arc<Mutex<HashSet<String>>>,
    max_pages: Option<usize>,
}

impl FrontierTx {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<String>,
        pending: Arc<AtomicUsize>,
        seen: Arc<Mutex<HashSet<String>>>,
        max_pages: Option<usize>,
    ) -> Self {
        Self {
            tx,
            pending,
            seen,
            max_pages,
        }
    }

    /// Enqueues a URL unless it was already enqueued during this crawl or
    /// the page cap is reached. Returns whether the URL was accepted.
    pub fn send(&self, url: &str) -> bool {
        {
            let mut seen = self.seen.lock().unwrap();
            if self.max_pages.map_or(false, |max| seen.len() >= max) {
                log::debug!("Page cap reached, dropping {url}");
                return false;
            }
            if !seen.insert(url.to_string()) {
                return false;
            }
        }
        // Count before sending: once the URL is in the channel a download
        // may complete (and decrement) before this thread runs again.
        self.pending.fetch_add(1, Ordering::SeqCst);
        match self.tx.send(url.to_string()) {
            Ok(()) => true,
            Err(e) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                log::error!("Couldn't enqueue URL: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frontier(max_pages: Option<usize>) -> (FrontierTx, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(HashSet::new()));
        (FrontierTx::new(tx, pending, seen, max_pages), rx)
    }

    #[test]
    fn url_is_enqueued_at_most_once() {
        let (tx, mut rx) = frontier(None);
        assert!(tx.send("https://x.com/about"));
        assert!(!tx.send("https://x.com/about"));
        assert_eq!(tx.pending.load(Ordering::SeqCst), 1);
        assert_eq!(rx.try_recv().ok().as_deref(), Some("https://x.com/about"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn failed_send_leaves_the_pending_count_untouched() {
        let (tx, rx) = frontier(None);
        drop(rx);
        assert!(!tx.send("https://x.com/about"));
        assert_eq!(tx.pending.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn page_cap_bounds_the_frontier() {
        let (tx, _rx) = frontier(Some(2));
        assert!(tx.send("https://x.com/a"));
        assert!(tx.send("https://x.com/b"));
        assert!(!tx.send("https://x.com/c"));
        assert_eq!(tx.pending.load(Ordering::SeqCst), 2);
    }
}
