//! Per-upstream circuit breaker: Closed → Open → HalfOpen → Closed.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
    pub max_half_open: u32,
    pub success_threshold: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(30),
            max_half_open: 3,
            success_threshold: 3,
        }
    }
}

struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    half_open_successes: u32,
    half_open_inflight: u32,
    opened_at: Option<Instant>,
}

pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                half_open_successes: 0,
                half_open_inflight: 0,
                opened_at: None,
            }),
        }
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    /// Call before dispatching. On `Denied`, the caller must fast-fail without touching the
    /// upstream and must not call `record_outcome`.
    pub fn allow(&self) -> Admission {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => Admission::Allowed,
            BreakerState::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.config.open_timeout {
                    transition(&mut inner, BreakerState::HalfOpen);
                    inner.half_open_inflight = 1;
                    Admission::Allowed
                } else {
                    Admission::Denied
                }
            }
            BreakerState::HalfOpen => {
                if inner.half_open_inflight < self.config.max_half_open {
                    inner.half_open_inflight += 1;
                    Admission::Allowed
                } else {
                    Admission::Denied
                }
            }
        }
    }

    /// Call exactly once per call admitted via `allow`, after the attempt completes.
    pub fn record_outcome(&self, success: bool) {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => {
                if success {
                    inner.consecutive_failures = 0;
                } else {
                    inner.consecutive_failures += 1;
                    if inner.consecutive_failures >= self.config.failure_threshold {
                        transition(&mut inner, BreakerState::Open);
                    }
                }
            }
            BreakerState::HalfOpen => {
                inner.half_open_inflight = inner.half_open_inflight.saturating_sub(1);
                if success {
                    inner.half_open_successes += 1;
                    if inner.half_open_successes >= self.config.success_threshold {
                        transition(&mut inner, BreakerState::Closed);
                    }
                } else {
                    transition(&mut inner, BreakerState::Open);
                }
            }
            BreakerState::Open => {}
        }
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        transition(&mut inner, BreakerState::Closed);
    }
}

fn transition(inner: &mut Inner, to: BreakerState) {
    let from = inner.state;
    inner.state = to;
    inner.consecutive_failures = 0;
    inner.half_open_successes = 0;
    inner.half_open_inflight = 0;
    if to == BreakerState::Open {
        inner.opened_at = Some(Instant::now());
    }
    if from != to {
        tracing::info!(?from, ?to, "circuit breaker transition");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BreakerConfig {
        BreakerConfig {
            failure_threshold: 2,
            open_timeout: Duration::from_millis(10),
            max_half_open: 1,
            success_threshold: 1,
        }
    }

    #[test]
    fn trips_after_threshold_failures() {
        let breaker = CircuitBreaker::new(test_config());
        assert_eq!(breaker.allow(), Admission::Allowed);
        breaker.record_outcome(false);
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.allow(), Admission::Allowed);
        breaker.record_outcome(false);
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[test]
    fn half_open_failure_returns_to_open() {
        let breaker = CircuitBreaker::new(test_config());
        breaker.allow();
        breaker.record_outcome(false);
        breaker.allow();
        breaker.record_outcome(false);
        assert_eq!(breaker.state(), BreakerState::Open);
        std::thread::sleep(Duration::from_millis(15));
        assert_eq!(breaker.allow(), Admission::Allowed);
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        breaker.record_outcome(false);
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[test]
    fn half_open_success_closes() {
        let breaker = CircuitBreaker::new(test_config());
        breaker.allow();
        breaker.record_outcome(false);
        breaker.allow();
        breaker.record_outcome(false);
        std::thread::sleep(Duration::from_millis(15));
        breaker.allow();
        breaker.record_outcome(true);
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn open_denies_before_timeout() {
        let breaker = CircuitBreaker::new(test_config());
        breaker.allow();
        breaker.record_outcome(false);
        breaker.allow();
        breaker.record_outcome(false);
        assert_eq!(breaker.allow(), Admission::Denied);
    }
}
