//! In-memory resolution cache.
//!
//! One abstraction, two expiry policies:
//! - `Bucketed`: street granularity. The stored key carries the current
//!   time-window index, so an entry silently dies at the next window
//!   rollover — remaining lifetime at insert ranges from near-zero to one
//!   full window depending on phase. Stale-window entries are purged on
//!   write.
//! - `Manual`: municipality granularity. Unbounded, lives until an explicit
//!   `clear` or process restart.
//!
//! The clock is injectable so tests can pin or advance the window.

use super::types::{ResolutionResult, ResolutionSource};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Street-granularity window: 5 minutes.
pub const STREET_WINDOW_MS: i64 = 300_000;

/// Millisecond wall clock.
#[derive(Clone)]
pub struct Clock(Arc<dyn Fn() -> i64 + Send + Sync>);

impl Clock {
    pub fn system() -> Self {
        Self(Arc::new(|| Utc::now().timestamp_millis()))
    }

    pub fn from_fn(f: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    fn now_ms(&self) -> i64 {
        (self.0)()
    }
}

#[derive(Debug, Clone, Copy)]
enum ExpiryPolicy {
    Bucketed { window_ms: i64 },
    Manual,
}

/// A normalized-key → result map guarded by a mutex; shared by reference
/// between concurrent resolutions.
pub struct ResolutionCache {
    policy: ExpiryPolicy,
    clock: Clock,
    entries: Mutex<HashMap<String, ResolutionResult>>,
}

impl ResolutionCache {
    /// Cache whose entries expire at each window rollover.
    pub fn bucketed(window_ms: i64) -> Self {
        Self {
            policy: ExpiryPolicy::Bucketed { window_ms },
            clock: Clock::system(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cache cleared only by an explicit call.
    pub fn manual() -> Self {
        Self {
            policy: ExpiryPolicy::Manual,
            clock: Clock::system(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the clock (for tests).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn stamped_key(&self, key: &str) -> String {
        match self.policy {
            ExpiryPolicy::Bucketed { window_ms } => {
                format!("{}@{}", key, self.clock.now_ms() / window_ms)
            }
            ExpiryPolicy::Manual => key.to_string(),
        }
    }

    /// Look up a key. Hits come back re-tagged with `source: Cache`.
    pub fn get(&self, key: &str) -> Option<ResolutionResult> {
        let stamped = self.stamped_key(key);
        let entries = self.entries.lock().unwrap();
        entries.get(&stamped).map(|r| {
            let mut hit = r.clone();
            hit.source = ResolutionSource::Cache;
            hit
        })
    }

    /// Store a result under the stamped key. In bucketed mode, entries from
    /// earlier windows are dropped here.
    pub fn put(&self, key: &str, result: &ResolutionResult) {
        let stamped = self.stamped_key(key);
        let mut entries = self.entries.lock().unwrap();
        if let ExpiryPolicy::Bucketed { window_ms } = self.policy {
            let suffix = format!("@{}", self.clock.now_ms() / window_ms);
            entries.retain(|k, _| k.ends_with(&suffix));
        }
        entries.insert(stamped, result.clone());
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored keys, window stamps included (for the introspection endpoint).
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
