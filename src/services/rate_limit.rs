//! Fixed-window attempt counters keyed by source address.
//!
//! This is a defense-in-depth control, not a correctness-critical one:
//! counters are best-effort shared state and slight over- or under-counting
//! under contention is acceptable.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateScope {
    Login,
    ResetAll,
    Import,
}

struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    windows: Mutex<HashMap<(RateScope, String), Window>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
        }
    }

    const fn policy(&self, scope: RateScope) -> (u32, Duration) {
        match scope {
            RateScope::Login => (self.config.login_per_minute, Duration::from_secs(60)),
            RateScope::ResetAll => (self.config.reset_all_per_hour, Duration::from_secs(3600)),
            RateScope::Import => (self.config.imports_per_hour, Duration::from_secs(3600)),
        }
    }

    /// Consume one slot for this source. Returns false once the window's
    /// quota is exhausted; the guarded operation must then fail before any
    /// business logic runs.
    pub fn try_acquire(&self, scope: RateScope, source: &str) -> bool {
        let (limit, window) = self.policy(scope);
        let now = Instant::now();

        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        // Opportunistic pruning; an hour covers the longest window.
        if windows.len() > 1024 {
            windows.retain(|_, w| now.duration_since(w.started) < Duration::from_secs(3600));
        }

        let entry = windows
            .entry((scope, source.to_string()))
            .or_insert(Window { started: now, count: 0 });

        if now.duration_since(entry.started) >= window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= limit {
            return false;
        }

        entry.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            login_per_minute: 3,
            reset_all_per_hour: 1,
            imports_per_hour: 5,
        })
    }

    #[test]
    fn test_quota_exhaustion() {
        let limiter = limiter();
        for _ in 0..3 {
            assert!(limiter.try_acquire(RateScope::Login, "10.0.0.1"));
        }
        assert!(!limiter.try_acquire(RateScope::Login, "10.0.0.1"));
    }

    #[test]
    fn test_sources_are_independent() {
        let limiter = limiter();
        for _ in 0..3 {
            assert!(limiter.try_acquire(RateScope::Login, "10.0.0.1"));
        }
        assert!(limiter.try_acquire(RateScope::Login, "10.0.0.2"));
    }

    #[test]
    fn test_scopes_are_independent() {
        let limiter = limiter();
        assert!(limiter.try_acquire(RateScope::ResetAll, "10.0.0.1"));
        assert!(!limiter.try_acquire(RateScope::ResetAll, "10.0.0.1"));
        assert!(limiter.try_acquire(RateScope::Login, "10.0.0.1"));
    }
}
