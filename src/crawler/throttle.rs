//! Rate limiting between external requests
//!
//! A throttle enforces a minimum delay between consecutive requests made
//! through it. Each crawler owns one; retrieval tasks share one behind a
//! mutex.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// A throttle shared between concurrent tasks
pub type SharedThrottle = Arc<Mutex<Throttle>>;

/// Minimum-delay gate for outgoing requests
#[derive(Debug)]
pub struct Throttle {
    delay: Duration,
    last_request: Option<Instant>,
}

impl Throttle {
    /// Creates a throttle with the given minimum delay
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: None,
        }
    }

    /// Creates a throttle from a delay in milliseconds
    pub fn from_millis(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms))
    }

    /// Wraps the throttle for sharing between tasks
    pub fn shared(self) -> SharedThrottle {
        Arc::new(Mutex::new(self))
    }

    /// Time left before the next request may be made
    ///
    /// Returns `None` if a request can be made right now.
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed >= self.delay {
            None
        } else {
            Some(self.delay - elapsed)
        }
    }

    /// Waits until a request may be made and records it
    pub async fn acquire(&mut self) {
        if let Some(wait) = self.time_until_ready(Instant::now()) {
            tracing::trace!("Throttling for {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        self.last_request = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_is_immediate() {
        let throttle = Throttle::from_millis(1000);
        assert!(throttle.time_until_ready(Instant::now()).is_none());
    }

    #[tokio::test]
    async fn test_second_request_waits() {
        let mut throttle = Throttle::from_millis(1000);
        throttle.acquire().await;

        let wait = throttle.time_until_ready(Instant::now());
        assert!(wait.is_some());
        assert!(wait.unwrap() <= Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_zero_delay_never_waits() {
        let mut throttle = Throttle::from_millis(0);
        throttle.acquire().await;
        assert!(throttle.time_until_ready(Instant::now()).is_none());
    }

    #[tokio::test]
    async fn test_acquire_enforces_delay() {
        let mut throttle = Throttle::from_millis(50);
        let start = Instant::now();

        throttle.acquire().await;
        throttle.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
