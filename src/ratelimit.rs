//! Per-user sliding-window rate limiter.
//!
//! Each user has a list of recent request instants; entries older than the
//! window are pruned lazily on every check. The read-modify-write of a check
//! is atomic under a single lock. Window state is process-lifetime only —
//! this is advisory admission control, not a durable quota.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.time_window_secs),
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or deny a request for `user_id`.
    ///
    /// A denied request leaves the user's window unmodified.
    pub fn is_allowed(&self, user_id: &str) -> bool {
        self.check_at(user_id, Instant::now())
    }

    fn check_at(&self, user_id: &str, now: Instant) -> bool {
        let mut requests = self.requests.lock().unwrap();
        let window = requests.entry(user_id.to_string()).or_default();

        window.retain(|t| now.duration_since(*t) < self.window);

        if window.len() >= self.max_requests {
            return false;
        }

        window.push(now);
        true
    }
}
