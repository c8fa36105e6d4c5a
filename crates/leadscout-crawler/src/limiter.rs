use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::config::Throttle;

/// Process-wide request throttle shared by every download slot.
///
/// Permits are replenished on a fixed interval by a background task, so the
/// request rate is bounded no matter how wide the download fan-out is.
/// Acquiring a slot only ever delays the caller, it never fails or drops a
/// request.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    permits: Arc<Semaphore>,
}

impl RateLimiter {
    /// Must be called within a tokio runtime.
    pub fn new(throttle: Throttle) -> Self {
        let (interval, batch) = match throttle {
            Throttle::PerSecond(n) => (Duration::from_secs(1), n.get() as usize),
            Throttle::Delay(secs) => (Duration::from_secs_f32(secs.max(0.001)), 1),
        };
        let permits = Arc::new(Semaphore::new(batch));
        tokio::spawn(refill(Arc::downgrade(&permits), interval, batch));
        Self { permits }
    }

    /// Waits for the next request slot.
    pub async fn acquire(&self) {
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }
}

async fn refill(permits: Weak<Semaphore>, interval: Duration, batch: usize) {
    loop {
        tokio::time::sleep(interval).await;
        match permits.upgrade() {
            Some(permits) => {
                // Top up instead of add, unused slots don't accumulate.
                let missing = batch.saturating_sub(permits.available_permits());
                permits.add_permits(missing);
            }
            // Limiter dropped, the crawl is over.
            None => break,
        }
    }
}
