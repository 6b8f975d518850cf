//! Hysteresis tracker that degrades to local-only play after repeated remote failures.

use tracing::{info, warn};

pub const FAILURE_THRESHOLD: u32 = 3;
pub const RECOVERY_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DegradationLevel {
    Remote,
    RemotePreferredLocalFallback,
    LocalOnly,
}

impl DegradationLevel {
    pub fn name(self) -> &'static str {
        match self {
            DegradationLevel::Remote => "remote",
            DegradationLevel::RemotePreferredLocalFallback => "remote-preferred-local-fallback",
            DegradationLevel::LocalOnly => "local-only",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerStats {
    pub failures: u32,
    pub successes: u32,
    pub level: DegradationLevel,
}

#[derive(Debug, Clone, Default)]
pub struct CircuitBreaker {
    failures: u32,
    successes: u32,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.successes += 1;
        self.failures = self.failures.saturating_sub(1);

        if RECOVERY_THRESHOLD <= self.successes && self.failures != 0 {
            info!("remote advisory fully recovered");
            self.failures = 0;
        }
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
        self.successes = 0;
        warn!(failures = self.failures, level = self.level().name(), "remote advisory failure");
    }

    pub fn record(&mut self, success: bool) {
        if success {
            self.record_success();
        } else {
            self.record_failure();
        }
    }

    pub fn level(&self) -> DegradationLevel {
        match self.failures {
            0 => DegradationLevel::Remote,
            n if n < FAILURE_THRESHOLD => DegradationLevel::RemotePreferredLocalFallback,
            _ => DegradationLevel::LocalOnly,
        }
    }

    pub fn should_fallback(&self) -> bool {
        FAILURE_THRESHOLD <= self.failures
    }

    pub fn reset(&mut self) {
        self.failures = 0;
        self.successes = 0;
    }

    pub fn stats(&self) -> BreakerStats {
        BreakerStats {
            failures: self.failures,
            successes: self.successes,
            level: self.level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_failures_go_local_only() {
        let mut breaker = CircuitBreaker::new();
        assert_eq!(breaker.level(), DegradationLevel::Remote);

        breaker.record_failure();
        assert_eq!(breaker.level(), DegradationLevel::RemotePreferredLocalFallback);
        breaker.record_failure();
        assert!(!breaker.should_fallback());
        breaker.record_failure();

        assert_eq!(breaker.level(), DegradationLevel::LocalOnly);
        assert!(breaker.should_fallback());
    }

    #[test]
    fn test_five_successes_fully_recover() {
        let mut breaker = CircuitBreaker::new();
        for _ in 0..10 {
            breaker.record_failure();
        }

        for _ in 0..4 {
            breaker.record_success();
        }
        assert_eq!(breaker.stats().failures, 6);
        assert!(breaker.should_fallback());

        breaker.record_success();
        assert_eq!(breaker.stats().failures, 0);
        assert_eq!(breaker.level(), DegradationLevel::Remote);
    }

    #[test]
    fn test_failure_resets_success_streak() {
        let mut breaker = CircuitBreaker::new();
        for _ in 0..3 {
            breaker.record(false);
        }
        for _ in 0..4 {
            breaker.record(true);
        }
        breaker.record(false);

        let stats = breaker.stats();
        assert_eq!(stats.successes, 0);
        assert_eq!(stats.failures, 1);

        breaker.reset();
        assert_eq!(breaker.stats().failures, 0);
    }
}
