//! Fixed-window request limiter for the HTTP API.
//!
//! Held as an explicit value in the server state rather than a module-global
//! map. Windows are tracked per client address; stale windows are pruned
//! once the map grows past a threshold so a scan of spoofed addresses cannot
//! grow memory without bound.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

const MAX_TRACKED_CLIENTS: usize = 10_000;

struct Window {
    started_at: Instant,
    count: u32,
}

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Records a request from `client` and reports whether it is allowed.
    pub fn check(&self, client: IpAddr) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> bool {
        let mut windows = self.windows.lock();

        if windows.len() > MAX_TRACKED_CLIENTS {
            windows.retain(|_, window| now.duration_since(window.started_at) < self.window);
        }

        let window = windows.entry(client).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now.duration_since(window.started_at) >= self.window {
            window.started_at = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            return false;
        }

        window.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> IpAddr {
        "192.0.2.1".parse().unwrap()
    }

    #[test]
    fn allows_up_to_the_limit_then_denies() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check_at(client(), now));
        assert!(limiter.check_at(client(), now));
        assert!(limiter.check_at(client(), now));
        assert!(!limiter.check_at(client(), now));
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check_at(client(), now));
        assert!(!limiter.check_at(client(), now));
        assert!(limiter.check_at(client(), now + Duration::from_secs(60)));
    }

    #[test]
    fn clients_are_tracked_independently() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        let other: IpAddr = "192.0.2.2".parse().unwrap();

        assert!(limiter.check_at(client(), now));
        assert!(limiter.check_at(other, now));
        assert!(!limiter.check_at(client(), now));
    }
}
