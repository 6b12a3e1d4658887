//! Login rate limiting.
//!
//! A process-wide map from client IP to attempt count with a reset
//! timestamp: at most 5 attempts per 15 minutes per IP. Expired entries are
//! swept every 5 minutes by a background task.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

/// Maximum login attempts per window.
const MAX_ATTEMPTS: u32 = 5;

/// The attempt window.
const WINDOW: chrono::Duration = chrono::Duration::minutes(15);

/// Sweep interval for expired entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// IP-keyed login rate limiter.
#[derive(Debug, Default)]
pub struct LoginRateLimiter {
    attempts: DashMap<IpAddr, Entry>,
}

impl LoginRateLimiter {
    /// Create an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt from `ip`. Returns `false` when the IP has
    /// exhausted its budget for the current window.
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Utc::now();
        let mut entry = self.attempts.entry(ip).or_insert(Entry {
            count: 0,
            reset_at: now + WINDOW,
        });

        if now >= entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + WINDOW;
        }

        entry.count += 1;
        entry.count <= MAX_ATTEMPTS
    }

    /// Drop entries whose window has passed.
    pub fn sweep(&self) {
        let now = Utc::now();
        let before = self.attempts.len();
        self.attempts.retain(|_, entry| now < entry.reset_at);
        let removed = before - self.attempts.len();
        if removed > 0 {
            debug!(removed, "swept expired login rate-limit entries");
        }
    }

    /// Spawn the periodic sweep task for a shared limiter.
    pub fn spawn_sweeper(limiter: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                limiter.sweep();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[test]
    fn test_should_allow_up_to_five_attempts() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..MAX_ATTEMPTS {
            assert!(limiter.check(ip(1)));
        }
        assert!(!limiter.check(ip(1)), "sixth attempt is rejected");
    }

    #[test]
    fn test_should_track_ips_independently() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..=MAX_ATTEMPTS {
            limiter.check(ip(1));
        }
        assert!(!limiter.check(ip(1)));
        assert!(limiter.check(ip(2)), "other IPs keep their budget");
    }

    #[test]
    fn test_should_sweep_only_expired_entries() {
        let limiter = LoginRateLimiter::new();
        limiter.check(ip(1));

        // Force the entry into the past, then sweep.
        limiter.attempts.entry(ip(1)).and_modify(|e| {
            e.reset_at = Utc::now() - chrono::Duration::seconds(1);
        });
        limiter.check(ip(2));

        limiter.sweep();
        assert!(!limiter.attempts.contains_key(&ip(1)));
        assert!(limiter.attempts.contains_key(&ip(2)));
    }

    #[test]
    fn test_should_reset_budget_after_window() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..=MAX_ATTEMPTS {
            limiter.check(ip(1));
        }
        assert!(!limiter.check(ip(1)));

        limiter.attempts.entry(ip(1)).and_modify(|e| {
            e.reset_at = Utc::now() - chrono::Duration::seconds(1);
        });
        assert!(limiter.check(ip(1)), "budget resets after the window");
    }
}
