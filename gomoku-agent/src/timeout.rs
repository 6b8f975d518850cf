//! Adaptive deadlines for remote calls.

use std::{collections::VecDeque, future::Future, time::Duration};
use tokio::time::Instant;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);
pub const MAX_TIMEOUT: Duration = Duration::from_millis(5000);
pub const HISTORY_SIZE: usize = 10;
const ADAPTIVE_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutStats {
    pub average_response: Duration,
    pub adaptive_timeout: Duration,
    pub history_size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TimeoutController {
    response_times: VecDeque<Duration>,
}

impl TimeoutController {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1.5x the mean of the last completed calls, clamped to
    /// [`DEFAULT_TIMEOUT`, `MAX_TIMEOUT`]; the default when nothing has completed yet.
    pub fn adaptive_timeout(&self) -> Duration {
        let Some(average) = self.average() else {
            return DEFAULT_TIMEOUT;
        };

        let millis = (average.as_millis() as f64 * ADAPTIVE_FACTOR).ceil() as u64;
        Duration::from_millis(millis).clamp(DEFAULT_TIMEOUT, MAX_TIMEOUT)
    }

    pub fn record_response_time(&mut self, elapsed: Duration) {
        if HISTORY_SIZE <= self.response_times.len() {
            self.response_times.pop_front();
        }
        self.response_times.push_back(elapsed);
    }

    pub fn reset(&mut self) {
        self.response_times.clear();
    }

    pub fn stats(&self) -> TimeoutStats {
        TimeoutStats {
            average_response: self.average().unwrap_or_default(),
            adaptive_timeout: self.adaptive_timeout(),
            history_size: self.response_times.len(),
        }
    }

    fn average(&self) -> Option<Duration> {
        if self.response_times.is_empty() {
            return None;
        }

        Some(self.response_times.iter().sum::<Duration>() / self.response_times.len() as u32)
    }
}

/// Outcome of a deadline-bounded call.
#[derive(Debug, Clone, PartialEq)]
pub struct Timed<T> {
    pub value: T,
    /// Completion time, or `None` when the deadline expired first.
    pub elapsed: Option<Duration>,
}

/// Races `future` against `deadline`; on expiry the future is dropped, cancelling the
/// underlying call, and `fallback` is returned.
pub async fn run_with_timeout<T, F>(future: F, deadline: Duration, fallback: T) -> Timed<T>
where
    F: Future<Output = T>,
{
    let started = Instant::now();

    match tokio::time::timeout(deadline, future).await {
        Ok(value) => {
            let elapsed = started.elapsed();
            debug!(elapsed_ms = elapsed.as_millis() as u64, "remote call completed");
            Timed {
                value,
                elapsed: Some(elapsed),
            }
        }
        Err(_) => {
            warn!(timeout_ms = deadline.as_millis() as u64, "remote call timed out");
            Timed {
                value: fallback,
                elapsed: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    #[test]
    fn test_adaptive_timeout() {
        let mut controller = TimeoutController::new();
        assert_eq!(controller.adaptive_timeout(), DEFAULT_TIMEOUT);

        controller.record_response_time(Duration::from_millis(400));
        assert_eq!(controller.adaptive_timeout(), DEFAULT_TIMEOUT);

        controller.record_response_time(Duration::from_millis(3000));
        // mean 1700ms * 1.5
        assert_eq!(controller.adaptive_timeout(), Duration::from_millis(2550));

        for _ in 0..HISTORY_SIZE {
            controller.record_response_time(Duration::from_millis(9000));
        }
        assert_eq!(controller.adaptive_timeout(), MAX_TIMEOUT);
        assert_eq!(controller.stats().history_size, HISTORY_SIZE);
        assert_eq!(controller.stats().average_response, Duration::from_millis(9000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_before_deadline() {
        let timed = run_with_timeout(
            async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Some(42)
            },
            DEFAULT_TIMEOUT,
            None,
        )
        .await;

        assert_eq!(timed.value, Some(42));
        let elapsed = timed.elapsed.unwrap();
        assert!(Duration::from_millis(300) <= elapsed && elapsed < DEFAULT_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_returns_fallback_and_cancels() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);

        let timed = run_with_timeout(
            async move {
                tokio::time::sleep(Duration::from_secs(10)).await;
                flag.store(true, Ordering::SeqCst);
                Some(1)
            },
            DEFAULT_TIMEOUT,
            None,
        )
        .await;

        assert_eq!(timed.value, None);
        assert_eq!(timed.elapsed, None);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }
}
