//! Shared request budget for external oracle calls.
//!
//! A token bucket: `burst` requests may go out at once, then tokens
//! refill at `requests_per_minute / 60` per second. One budget is shared
//! by every classifier in the process, so parallel batch runs draw from
//! the same quota.

use parking_lot::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
    blocked_until: Option<Instant>,
}

#[derive(Debug)]
pub struct RequestBudget {
    /// `None` means unlimited.
    limit: Option<Limit>,
    bucket: Mutex<Bucket>,
}

#[derive(Debug, Clone, Copy)]
struct Limit {
    capacity: f64,
    refill_per_sec: f64,
}

impl RequestBudget {
    pub fn per_minute(requests_per_minute: u32, burst: u32) -> Self {
        let capacity = burst.max(1) as f64;
        Self {
            limit: Some(Limit {
                capacity,
                refill_per_sec: requests_per_minute as f64 / 60.0,
            }),
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
                blocked_until: None,
            }),
        }
    }

    pub fn unlimited() -> Self {
        Self {
            limit: None,
            bucket: Mutex::new(Bucket {
                tokens: 0.0,
                last_refill: Instant::now(),
                blocked_until: None,
            }),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.limit.is_none()
    }

    /// Take one token if available now.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now()).is_ok()
    }

    /// Take one token, waiting up to `max_wait` for one to refill.
    pub fn acquire(&self, max_wait: Duration) -> bool {
        let start = Instant::now();
        loop {
            let now = Instant::now();
            let wait = match self.try_acquire_at(now) {
                Ok(()) => return true,
                Err(wait) => wait,
            };
            if now.duration_since(start).saturating_add(wait) > max_wait {
                debug!(?wait, "request budget exhausted");
                return false;
            }
            thread::sleep(wait);
        }
    }

    /// Stop handing out tokens for `pause` (the remote side reported
    /// its quota exceeded) and drain the bucket.
    pub fn back_off(&self, pause: Duration) {
        if self.limit.is_none() {
            return;
        }
        let mut b = self.bucket.lock();
        let until = Instant::now() + pause;
        b.tokens = 0.0;
        b.blocked_until = Some(b.blocked_until.map_or(until, |cur| cur.max(until)));
        info!(pause_secs = pause.as_secs_f64(), "oracle quota exceeded, backing off");
    }

    /// `Err` carries how long until a token could be available.
    fn try_acquire_at(&self, now: Instant) -> Result<(), Duration> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        let mut b = self.bucket.lock();

        if let Some(until) = b.blocked_until {
            if now < until {
                return Err(until - now);
            }
            b.blocked_until = None;
            b.last_refill = until;
        }

        let elapsed = now.saturating_duration_since(b.last_refill).as_secs_f64();
        b.tokens = (b.tokens + elapsed * limit.refill_per_sec).min(limit.capacity);
        b.last_refill = now;

        if b.tokens >= 1.0 {
            b.tokens -= 1.0;
            return Ok(());
        }
        if limit.refill_per_sec <= 0.0 {
            return Err(Duration::MAX);
        }
        Err(Duration::from_secs_f64((1.0 - b.tokens) / limit.refill_per_sec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_empty() {
        let budget = RequestBudget::per_minute(60, 2);
        let now = Instant::now();
        assert!(budget.try_acquire_at(now).is_ok());
        assert!(budget.try_acquire_at(now).is_ok());
        let wait = budget.try_acquire_at(now).unwrap_err();
        assert!(wait <= Duration::from_secs(1));
    }

    #[test]
    fn test_refills_over_time() {
        let budget = RequestBudget::per_minute(60, 1);
        let now = Instant::now();
        assert!(budget.try_acquire_at(now).is_ok());
        assert!(budget.try_acquire_at(now).is_err());
        assert!(budget.try_acquire_at(now + Duration::from_millis(1100)).is_ok());
    }

    #[test]
    fn test_zero_rate_never_refills() {
        let budget = RequestBudget::per_minute(0, 1);
        assert!(budget.try_acquire());
        assert!(!budget.acquire(Duration::from_millis(10)));
    }

    #[test]
    fn test_back_off_blocks_until_pause_ends() {
        let budget = RequestBudget::per_minute(600, 5);
        budget.back_off(Duration::from_secs(30));
        assert!(!budget.try_acquire());
        assert!(!budget.acquire(Duration::from_millis(5)));
    }

    #[test]
    fn test_unlimited_always_grants() {
        let budget = RequestBudget::unlimited();
        assert!(budget.is_unlimited());
        for _ in 0..1000 {
            assert!(budget.try_acquire());
        }
        budget.back_off(Duration::from_secs(60));
        assert!(budget.try_acquire());
    }
}
