use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Error, Result};
use futures::{future, try_join, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::config::{CrawlerConfig, OnError};
use crate::fetch;
use crate::limiter::RateLimiter;
use crate::scrapable::{FrontierTx, Scrapable};

#[derive(Debug)]
struct Page {
    page: String,
    url: String,
}

/// Crawls one site: seeds the frontier from the scraper, fans out rate
/// limited downloads, and feeds fetched pages to a pool of scrap workers
/// that may in turn discover new frontier URLs.
///
/// Terminates when every enqueued URL has been fully processed (quiescence
/// over the in/out counters, which accounts for in-flight work), when the
/// page cap or crawl deadline is hit, or on SIGINT when enabled. Workers are
/// signaled through a stop channel and joined before returning.
pub async fn crawl_site<T>(crawler_conf: &CrawlerConfig, scraper_conf: &T::Config) -> Result<()>
where
    T: Scrapable,
{
    let pages_in = Arc::new(AtomicUsize::new(0));
    let pages_out = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(HashSet::new()));
    let stop = Arc::new(AtomicBool::new(false));

    let (tx_stop, rx_stop) = crossbeam_channel::unbounded::<()>();
    let (tx_url, rx_url) = mpsc::unbounded_channel::<String>();
    let (tx_page, rx_page) = crossbeam_channel::bounded::<Page>(crawler_conf.page_buffer);

    let tx_url = FrontierTx::new(tx_url, pages_in.clone(), seen, crawler_conf.max_pages);

    let client = fetch::build_client(crawler_conf)?;
    let limiter = crawler_conf.throttle.map(RateLimiter::new);

    // Seed before anything can observe the counters, otherwise an empty
    // frontier looks like a finished crawl.
    for url in <T as Scrapable>::new(scraper_conf)?.seed() {
        tx_url.send(&url);
    }

    // Workers

    let mut workers = vec![];
    for id in 0..crawler_conf.num_workers {
        let rx_stop = rx_stop.clone();
        let rx_page = rx_page.clone();
        let tx_url = tx_url.clone();
        let pages_out = pages_out.clone();
        let stop = stop.clone();
        let scraper_conf = scraper_conf.clone();
        let crawler_conf = crawler_conf.clone();
        let worker = thread::Builder::new()
            .name(format!("scrap-{id}"))
            .spawn(move || {
                let mut scraper = <T as Scrapable>::new(&scraper_conf)?;
                scraper.init(tx_url);
                loop {
                    crossbeam_channel::select! {
                        recv(rx_page) -> page => {
                            if let Ok(Page { page, url }) = page {
                                match scraper.scrap(page, &url) {
                                    Ok(()) => (),
                                    Err(e) => match crawler_conf.on_scrap_error {
                                        OnError::SkipAndLog => {
                                            log::error!("Skipping scrap for page {url} got: {e}");
                                        }
                                        OnError::Fail => {
                                            stop.store(true, Ordering::SeqCst);
                                            return Err(e);
                                        }
                                    },
                                }
                                pages_out.fetch_add(1, Ordering::SeqCst);
                            } else {
                                break
                            }
                        },
                        recv(rx_stop) -> _ => break
                    }
                }
                Ok::<(), Error>(())
            })?;
        workers.push(worker);
    }
    drop(tx_url);
    drop(rx_page);
    let workers = async move {
        tokio::task::spawn_blocking(|| {
            for w in workers {
                w.join().map_err(|_| anyhow!("Scrap worker panicked"))??;
            }
            Ok::<(), Error>(())
        })
        .await?
    };

    // Downloader

    let client = &client;
    let limiter = limiter.as_ref();
    let pages_in_c = pages_in.clone();
    let stop_c = stop.clone();
    let downloader = async move {
        let stream = UnboundedReceiverStream::new(rx_url)
            .map(|url| {
                let pages_in = pages_in_c.clone();
                let stop = stop_c.clone();
                async move {
                    if stop.load(Ordering::SeqCst) {
                        pages_in.fetch_sub(1, Ordering::SeqCst);
                        return Ok(None);
                    }
                    match fetch::fetch_page(client, limiter, &url).await {
                        Ok(Some(page)) => Ok(Some(Page { page, url })),
                        Ok(None) => {
                            pages_in.fetch_sub(1, Ordering::SeqCst);
                            Ok(None)
                        }
                        Err(e) => {
                            pages_in.fetch_sub(1, Ordering::SeqCst);
                            Err(anyhow!("{url} got: {e}"))
                        }
                    }
                }
            })
            .buffer_unordered(crawler_conf.concurrent_downloads);

        match crawler_conf.on_dl_error {
            OnError::Fail => {
                let mut err = Ok::<(), Error>(());
                stream
                    .scan(&mut err, until_err)
                    .for_each(|page| {
                        if let Some(page) = page {
                            tx_page.send(page).ok();
                        }
                        future::ready(())
                    })
                    .await;
                err
            }
            OnError::SkipAndLog => {
                stream
                    .for_each(|dl| {
                        match dl {
                            Ok(Some(page)) => {
                                tx_page.send(page).ok();
                            }
                            Ok(None) => (),
                            Err(e) => log::warn!("Skipping URL: {e}"),
                        }
                        future::ready(())
                    })
                    .await;
                Ok(())
            }
        }
    };

    // Termination watcher

    let tick = Duration::from_millis(500);
    let deadline = crawler_conf.crawl_timeout.map(Duration::from_secs_f32);
    let handle_sigint = crawler_conf.handle_sigint;
    let num_workers = crawler_conf.num_workers;
    let started = Instant::now();
    let done = async move {
        let shutdown = |stop: &AtomicBool| {
            stop.store(true, Ordering::SeqCst);
            for _ in 0..num_workers {
                tx_stop.send(()).ok();
            }
        };
        loop {
            let interrupted = if handle_sigint {
                timeout(tick, tokio::signal::ctrl_c()).await.is_ok()
            } else {
                tokio::time::sleep(tick).await;
                false
            };
            if interrupted {
                shutdown(&stop);
                return Err::<(), _>(anyhow!("Interrupted"));
            }
            if deadline.map_or(false, |d| started.elapsed() >= d) {
                log::warn!("Crawl deadline reached, stopping with partial results");
                shutdown(&stop);
                return Ok(());
            }
            let drained =
                pages_out.load(Ordering::SeqCst) == pages_in.load(Ordering::SeqCst);
            if drained || stop.load(Ordering::SeqCst) {
                shutdown(&stop);
                return Ok(());
            }
        }
    };

    let res = try_join!(workers, downloader, done);
    <T as Scrapable>::new(scraper_conf)?.finalizer();
    res?;

    Ok(())
}

fn until_err<T, E>(
    err: &mut &mut Result<(), E>,
    item: Result<T, E>,
) -> impl Future<Output = Option<T>> {
    match item {
        Ok(item) => future::ready(Some(item)),
        Err(e) => {
            **err = Err(e);
            future::ready(None)
        }
    }
}
