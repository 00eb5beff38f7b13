//! Global request spacing for the market data provider.
//!
//! The provider's free tier caps throughput for the whole process, so one
//! [`RateLimiter`] is shared by every operation and every symbol. It is an
//! explicitly constructed value handed to the client, never a module-level
//! singleton.

mod clock;

pub use clock::{Clock, ManualClock, TokioClock};

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default spacing between two outbound requests (5 requests per minute).
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(12);

/// Enforces a minimum gap between consecutive provider requests.
///
/// Callers are served in FIFO order: the internal async mutex is held across
/// the wait, so concurrent tasks line up behind each other and no two calls
/// return closer together than `min_interval`.
pub struct RateLimiter {
    /// Minimum spacing between two `throttle` completions.
    min_interval: Duration,
    /// Completion instant of the previous `throttle` call.
    last_call: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter driven by the tokio timer.
    pub fn new(min_interval: Duration) -> Self {
        Self::with_clock(min_interval, Arc::new(TokioClock))
    }

    /// Create a limiter with an injected clock.
    pub fn with_clock(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
            clock,
        }
    }

    /// Convenience constructor for the common shared case.
    pub fn shared(min_interval: Duration) -> Arc<Self> {
        Arc::new(Self::new(min_interval))
    }

    /// Configured spacing.
    pub fn interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until `min_interval` has elapsed since the previous call
    /// returned, then record the new completion instant.
    ///
    /// The first call never waits.
    pub async fn throttle(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(last) = *last_call {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!("Rate limiting: waiting {:?} before next request", wait);
                self.clock.sleep(wait).await;
            }
        }

        *last_call = Some(self.clock.now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_call_does_not_wait() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(Duration::from_secs(12), clock.clone());

        limiter.throttle().await;

        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_second_call_waits_remaining_interval() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(Duration::from_secs(12), clock.clone());

        limiter.throttle().await;
        clock.advance(Duration::from_secs(5));
        limiter.throttle().await;

        assert_eq!(clock.sleeps(), vec![Duration::from_secs(7)]);
    }

    #[tokio::test]
    async fn test_no_wait_once_interval_has_passed() {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(Duration::from_secs(12), clock.clone());

        limiter.throttle().await;
        clock.advance(Duration::from_secs(30));
        limiter.throttle().await;

        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_spacing_holds_for_every_consecutive_pair() {
        let clock = Arc::new(ManualClock::new());
        let interval = Duration::from_millis(12_000);
        let limiter = RateLimiter::with_clock(interval, clock.clone());

        let mut returns = Vec::new();
        for step in [0u64, 1_000, 20_000, 11_999, 0] {
            clock.advance(Duration::from_millis(step));
            limiter.throttle().await;
            returns.push(clock.now());
        }

        for pair in returns.windows(2) {
            assert!(pair[1] - pair[0] >= interval);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_serialized() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(12)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.throttle().await;
                Instant::now()
            }));
        }

        let mut returns = Vec::new();
        for handle in handles {
            returns.push(handle.await.unwrap());
        }
        returns.sort();

        assert_eq!(returns[0] - start, Duration::ZERO);
        assert!(returns[1] - returns[0] >= Duration::from_secs(12));
        assert!(returns[2] - returns[1] >= Duration::from_secs(12));
    }

    #[test]
    fn test_default_interval() {
        assert_eq!(RateLimiter::default().interval(), Duration::from_secs(12));
    }
}
