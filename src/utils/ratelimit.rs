//! Sliding-window request limiter, one per upstream vendor
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct SlidingWindow {
    /// Timestamps of requests inside the current window
    request_times: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl SlidingWindow {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            request_times: VecDeque::new(),
            max_requests,
            window,
        }
    }

    /// Record a request if there is room; otherwise report how long to wait
    fn check_and_record(&mut self, now: Instant) -> Duration {
        // A request exactly `window` old no longer counts
        while let Some(&front) = self.request_times.front() {
            if now.duration_since(front) >= self.window {
                self.request_times.pop_front();
            } else {
                break;
            }
        }

        if self.request_times.len() >= self.max_requests {
            if let Some(&oldest) = self.request_times.front() {
                let elapsed = now.duration_since(oldest);
                if elapsed < self.window {
                    return self.window - elapsed;
                }
            }
        }

        self.request_times.push_back(now);
        Duration::from_secs(0)
    }
}

pub struct RateLimiter {
    name: &'static str,
    window: Mutex<SlidingWindow>,
}

impl RateLimiter {
    pub fn new(name: &'static str, max_requests: usize, window: Duration) -> Self {
        Self {
            name,
            window: Mutex::new(SlidingWindow::new(max_requests, window)),
        }
    }

    /// Wait until the window has room, then record the request
    pub async fn acquire(&self) {
        loop {
            let wait_duration = {
                let mut window = self.window.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                window.check_and_record(Instant::now())
            };

            if wait_duration.is_zero() {
                return;
            }

            tracing::debug!("{} rate limit: waiting {}ms", self.name, wait_duration.as_millis());
            tokio::time::sleep(wait_duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_allows_requests_within_limit() {
        let mut limiter = SlidingWindow::new(20, Duration::from_secs(1));
        let now = Instant::now();

        for _ in 0..20 {
            let wait = limiter.check_and_record(now);
            assert_eq!(wait.as_millis(), 0);
        }
    }

    #[test]
    fn test_rate_limiter_blocks_over_limit() {
        let mut limiter = SlidingWindow::new(20, Duration::from_secs(1));
        let now = Instant::now();

        for _ in 0..20 {
            limiter.check_and_record(now);
        }

        let wait = limiter.check_and_record(now + Duration::from_millis(400));
        assert_eq!(wait, Duration::from_millis(600));
    }

    #[test]
    fn test_window_frees_up() {
        let mut limiter = SlidingWindow::new(1, Duration::from_secs(1));
        let now = Instant::now();
        limiter.check_and_record(now);
        assert_eq!(limiter.check_and_record(now + Duration::from_millis(1001)), Duration::ZERO);
    }

    #[test]
    fn test_window_boundary_never_exceeds_max() {
        let mut limiter = SlidingWindow::new(1, Duration::from_secs(1));
        let now = Instant::now();
        limiter.check_and_record(now);

        let later = now + Duration::from_secs(1);
        assert_eq!(limiter.check_and_record(later), Duration::ZERO);
        assert_eq!(limiter.request_times.len(), 1);
        assert_eq!(limiter.check_and_record(later), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_acquire_within_limit_does_not_wait() {
        let limiter = RateLimiter::new("test", 3, Duration::from_secs(60));
        let started = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
