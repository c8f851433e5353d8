//! Sliding-window request limiter for outbound API calls.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;
use triarb_core::error::DataError;

/// Admits at most `limit` requests in any trailing `window`.
///
/// Never sleeps: a request over the limit is refused with
/// [`DataError::RateLimited`] carrying the time until the oldest
/// admitted request leaves the window.
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    name: String,
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter. A zero limit refuses every request.
    pub fn new(limit: usize, window: Duration, name: &str) -> Self {
        Self {
            limit,
            window,
            name: name.to_string(),
            admitted: Mutex::new(VecDeque::with_capacity(limit)),
        }
    }

    /// Admit a request now or report how long to wait.
    pub fn check(&self) -> Result<(), DataError> {
        self.check_at(Instant::now())
    }

    fn check_at(&self, now: Instant) -> Result<(), DataError> {
        let mut admitted = self.admitted.lock().unwrap_or_else(|e| e.into_inner());

        while let Some(oldest) = admitted.front() {
            if now.duration_since(*oldest) >= self.window {
                admitted.pop_front();
            } else {
                break;
            }
        }

        if admitted.len() >= self.limit {
            let retry_after = admitted
                .front()
                .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
                .unwrap_or(self.window);
            debug!(limiter = %self.name, retry_after_ms = retry_after.as_millis() as u64, "request refused");
            return Err(DataError::RateLimited {
                retry_after_ms: retry_after.as_millis() as u64,
            });
        }

        admitted.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1), "test");
        let now = Instant::now();

        assert!(limiter.check_at(now).is_ok());
        assert!(limiter.check_at(now).is_ok());
        assert!(limiter.check_at(now).is_ok());

        match limiter.check_at(now + Duration::from_millis(400)) {
            Err(DataError::RateLimited { retry_after_ms }) => assert_eq!(retry_after_ms, 600),
            other => panic!("expected rate limit, got {:?}", other),
        }
    }

    #[test]
    fn test_window_slides() {
        let limiter = RateLimiter::new(2, Duration::from_millis(100), "test");
        let start = Instant::now();

        assert!(limiter.check_at(start).is_ok());
        assert!(limiter.check_at(start + Duration::from_millis(50)).is_ok());
        assert!(limiter.check_at(start + Duration::from_millis(60)).is_err());

        // First request has aged out, second still counts
        assert!(limiter.check_at(start + Duration::from_millis(100)).is_ok());
        assert!(limiter.check_at(start + Duration::from_millis(120)).is_err());
    }

    #[test]
    fn test_refused_requests_do_not_count() {
        let limiter = RateLimiter::new(1, Duration::from_millis(100), "test");
        let start = Instant::now();

        assert!(limiter.check_at(start).is_ok());
        for ms in [10, 20, 30] {
            assert!(limiter.check_at(start + Duration::from_millis(ms)).is_err());
        }
        assert!(limiter.check_at(start + Duration::from_millis(100)).is_ok());
    }

    #[test]
    fn test_zero_limit_refuses() {
        let limiter = RateLimiter::new(0, Duration::from_secs(1), "test");
        assert!(matches!(
            limiter.check(),
            Err(DataError::RateLimited { retry_after_ms: 1000 })
        ));
    }
}
