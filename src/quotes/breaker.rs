use crate::config::BreakerConfig;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakerState::Closed => write!(f, "CLOSED"),
            BreakerState::Open => write!(f, "OPEN"),
            BreakerState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// A state change observed by `record_success`/`record_failure`. Callers
/// forward these to the notifier; the breaker itself only logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakerTransition {
    pub from: BreakerState,
    pub to: BreakerState,
}

/// Snapshot of breaker internals for telemetry.
#[derive(Clone, Debug)]
pub struct BreakerStateInfo {
    pub name: String,
    pub state: BreakerState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    pub time_until_recovery: Duration,
    pub half_open_successes: u32,
    pub half_open_failures: u32,
}

struct BreakerInner {
    state: BreakerState,
    failure_count: u32,
    last_failure_time: Option<Instant>,
    half_open_successes: u32,
    half_open_failures: u32,
}

/// Failure isolator for one operation class (e.g. "quote fetch").
///
/// CLOSED counts consecutive failures and opens at the threshold. While
/// OPEN, `can_proceed()` refuses work until the recovery timeout has
/// elapsed; the call that observes the elapsed timeout transitions to
/// HALF_OPEN (no background timer). HALF_OPEN requires a run of
/// consecutive successes to close, and reopens after a run of consecutive
/// failures, re-arming the full recovery timeout.
///
/// The lock only covers the in-memory read-modify-write; callers never
/// hold it across I/O. The breaker itself never fails.
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    recovery_timeout: Duration,
    half_open_success_threshold: u32,
    half_open_failure_threshold: u32,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(
        name: impl Into<String>,
        failure_threshold: u32,
        recovery_timeout: Duration,
        half_open_success_threshold: u32,
        half_open_failure_threshold: u32,
    ) -> Self {
        CircuitBreaker {
            name: name.into(),
            failure_threshold,
            recovery_timeout,
            half_open_success_threshold,
            half_open_failure_threshold,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                failure_count: 0,
                last_failure_time: None,
                half_open_successes: 0,
                half_open_failures: 0,
            }),
        }
    }

    pub fn from_config(name: impl Into<String>, config: &BreakerConfig) -> Self {
        Self::new(
            name,
            config.failure_threshold,
            config.recovery_timeout(),
            config.half_open_success_threshold,
            config.half_open_failure_threshold,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a protected call may go ahead. Performs the OPEN → HALF_OPEN
    /// transition when the recovery timeout has elapsed.
    pub fn can_proceed(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let elapsed = inner
                    .last_failure_time
                    .map(|t| t.elapsed() >= self.recovery_timeout)
                    .unwrap_or(true);
                if elapsed {
                    inner.state = BreakerState::HalfOpen;
                    inner.half_open_successes = 0;
                    inner.half_open_failures = 0;
                    tracing::info!(breaker = %self.name, "HALF_OPEN (recovery attempt)");
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) -> Option<BreakerTransition> {
        let mut inner = self.lock();
        let from = inner.state;
        match inner.state {
            BreakerState::HalfOpen => {
                inner.half_open_successes += 1;
                inner.half_open_failures = 0;
                if inner.half_open_successes >= self.half_open_success_threshold {
                    inner.state = BreakerState::Closed;
                    inner.failure_count = 0;
                    inner.half_open_successes = 0;
                    inner.half_open_failures = 0;
                    tracing::info!(breaker = %self.name, "CLOSED after successful recovery");
                    return Some(BreakerTransition {
                        from,
                        to: BreakerState::Closed,
                    });
                }
                None
            }
            _ => {
                inner.failure_count = 0;
                inner.half_open_successes = 0;
                inner.half_open_failures = 0;
                if inner.state != BreakerState::Closed {
                    inner.state = BreakerState::Closed;
                    return Some(BreakerTransition {
                        from,
                        to: BreakerState::Closed,
                    });
                }
                None
            }
        }
    }

    pub fn record_failure(&self) -> Option<BreakerTransition> {
        let mut inner = self.lock();
        let from = inner.state;
        inner.last_failure_time = Some(Instant::now());
        match inner.state {
            BreakerState::HalfOpen => {
                inner.half_open_failures += 1;
                inner.half_open_successes = 0;
                if inner.half_open_failures >= self.half_open_failure_threshold {
                    inner.state = BreakerState::Open;
                    // Pin at the threshold so the full recovery timeout
                    // applies again.
                    inner.failure_count = self.failure_threshold;
                    inner.half_open_successes = 0;
                    inner.half_open_failures = 0;
                    tracing::warn!(breaker = %self.name, "RE-OPENED after failures in HALF_OPEN");
                    return Some(BreakerTransition {
                        from,
                        to: BreakerState::Open,
                    });
                }
                None
            }
            BreakerState::Open => None,
            BreakerState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.failure_threshold {
                    inner.state = BreakerState::Open;
                    tracing::warn!(
                        breaker = %self.name,
                        failures = inner.failure_count,
                        "OPENED"
                    );
                    return Some(BreakerTransition {
                        from,
                        to: BreakerState::Open,
                    });
                }
                None
            }
        }
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn state_info(&self) -> BreakerStateInfo {
        let inner = self.lock();
        let time_until_recovery = match (inner.state, inner.last_failure_time) {
            (BreakerState::Open, Some(t)) => self.recovery_timeout.saturating_sub(t.elapsed()),
            _ => Duration::ZERO,
        };
        BreakerStateInfo {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            failure_threshold: self.failure_threshold,
            time_until_recovery,
            half_open_successes: inner.half_open_successes,
            half_open_failures: inner.half_open_failures,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        // A poisoned breaker lock only means a panic elsewhere; the state
        // itself is still a valid machine, so keep serving it.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
