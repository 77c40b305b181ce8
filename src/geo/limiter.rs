//! Shared spacing gate for outbound geocoding calls.
//!
//! Nominatim's usage policy allows at most one request per second per
//! application, process-wide. The gate is a single timestamp behind a
//! mutex; `acquire` holds the lock through its wait, so concurrent
//! resolutions queue instead of racing the timestamp and slipping two
//! calls into the same window.

use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_MIN_INTERVAL)
    }

    /// Custom spacing (tests use millisecond intervals).
    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Block until the minimum spacing since the previous call anywhere in
    /// the process has elapsed, then stamp. Never fails, never aborts.
    pub fn acquire(&self) {
        let mut last = self.last_call.lock().unwrap();
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::with_interval(Duration::from_millis(200));
        let start = Instant::now();
        limiter.acquire();
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_sequential_acquires_are_spaced() {
        let limiter = RateLimiter::with_interval(Duration::from_millis(50));
        let start = Instant::now();
        limiter.acquire();
        limiter.acquire();
        limiter.acquire();
        // Three calls enforce two full waits.
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_concurrent_acquires_serialize() {
        let limiter = Arc::new(RateLimiter::with_interval(Duration::from_millis(50)));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.acquire())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_spacing_not_required_after_interval_passed() {
        let limiter = RateLimiter::with_interval(Duration::from_millis(20));
        limiter.acquire();
        std::thread::sleep(Duration::from_millis(30));
        let start = Instant::now();
        limiter.acquire();
        assert!(start.elapsed() < Duration::from_millis(15));
    }
}
