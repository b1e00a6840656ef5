//! Request throttling for the spending analysis.
//!
//! The limiter is a service passed to whoever needs it. A deployment with
//! several instances can implement [RateLimiter] on top of a shared store.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::Instant,
};

use crate::config::RateLimitConfig;

/// Decides whether a caller may make another request.
pub trait RateLimiter: Send + Sync {
    /// Record a request for `key` and return whether it is allowed.
    fn check(&self, key: &str) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    count: u32,
    window_start: Instant,
}

/// Counts requests per key in fixed windows held in memory.
///
/// A key's window restarts on the first request made after the window has
/// elapsed. Rejected requests still count towards the limit. Counters of
/// elapsed windows are removed on the next check, whatever its key.
#[derive(Debug, Default)]
pub struct FixedWindowRateLimiter {
    config: RateLimitConfig,
    counters: Mutex<HashMap<String, WindowCounter>>,
}

impl FixedWindowRateLimiter {
    /// Create a limiter with empty counters.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for `key` made at `now` and return whether it is allowed.
    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        // The counters stay consistent even if a holder of the lock panicked.
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);

        // Expired windows are dropped, so a returning key starts a new one.
        counters.retain(|_, counter| {
            now.saturating_duration_since(counter.window_start) <= self.config.window
        });

        let counter = counters.entry(key.to_owned()).or_insert(WindowCounter {
            count: 0,
            window_start: now,
        });

        counter.count = counter.count.saturating_add(1);
        let allowed = counter.count <= self.config.max_requests;

        if !allowed {
            tracing::warn!("rate limit exceeded for {key}");
        }

        allowed
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }
}
