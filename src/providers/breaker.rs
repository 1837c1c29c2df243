//! Circuit breaker guarding calls to a single upstream.
//!
//! ```text
//! Closed --(failures >= threshold)--> Open --(recovery elapsed)--> HalfOpen
//! HalfOpen --(success)--> Closed
//! HalfOpen --(failure)--> Open (re-stamped)
//! ```
//!
//! Time comes from the tokio clock, so tests can pause and advance it.
//! The state mutex is only ever held for the in-memory update.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::{DetectorError, Result};

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Breaker tuning.
///
/// ```rust
/// # use detector_gateway::providers::breaker::BreakerConfig;
/// # use std::time::Duration;
/// let config = BreakerConfig::new()
///     .failure_threshold(5)
///     .recovery(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures that open the breaker. Default: 3.
    pub failure_threshold: u32,
    /// How long the breaker stays open before allowing a trial call. Default: 30s.
    pub recovery: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery: Duration::from_secs(30),
        }
    }
}

impl BreakerConfig {
    /// Default tuning: 3 failures, 30s recovery.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the consecutive-failure threshold.
    pub fn failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n;
        self
    }

    /// Set how long the breaker stays open.
    pub fn recovery(mut self, recovery: Duration) -> Self {
        self.recovery = recovery;
        self
    }
}

/// Point-in-time view of the breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    /// Time left before a trial call is allowed, if currently open.
    pub open_remaining: Option<Duration>,
}

/// State change caused by one recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CircuitState,
    pub to: CircuitState,
}

impl Transition {
    /// Whether this failure is the one that opened the breaker.
    pub fn opened(&self) -> bool {
        self.from != CircuitState::Open && self.to == CircuitState::Open
    }
}

#[derive(Debug)]
struct State {
    state: CircuitState,
    failure_count: u32,
    opened_at: Option<Instant>,
}

/// Consecutive-failure circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: Mutex<State>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State {
                state: CircuitState::Closed,
                failure_count: 0,
                opened_at: None,
            }),
        }
    }

    /// Ask for permission to issue a call.
    ///
    /// Returns the state the call proceeds under (`Closed` or `HalfOpen`),
    /// or [`DetectorError::CircuitOpen`] while the recovery window runs.
    pub fn allow(&self) -> Result<CircuitState> {
        let mut st = self.lock();
        if st.state == CircuitState::Open {
            let opened_at = st.opened_at.unwrap_or_else(Instant::now);
            if opened_at.elapsed() < self.config.recovery {
                return Err(DetectorError::CircuitOpen);
            }
            st.state = CircuitState::HalfOpen;
        }
        Ok(st.state)
    }

    /// Reset to `Closed` with a zero failure count.
    pub fn record_success(&self) {
        let mut st = self.lock();
        st.state = CircuitState::Closed;
        st.failure_count = 0;
        st.opened_at = None;
    }

    /// Count a failure, opening the breaker at the threshold.
    ///
    /// Returns the states before and after, read under one lock, so
    /// concurrent failures agree on which of them opened the breaker.
    pub fn record_failure(&self) -> Transition {
        let mut st = self.lock();
        let from = st.state;
        st.failure_count = st.failure_count.saturating_add(1);
        if st.failure_count >= self.config.failure_threshold {
            st.state = CircuitState::Open;
            st.opened_at = Some(Instant::now());
        }
        Transition { from, to: st.state }
    }

    /// Current state, without promoting an expired `Open` to `HalfOpen`.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Consecutive failures since the last success.
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// Tuning this breaker was built with.
    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Point-in-time view for health reporting.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let st = self.lock();
        let open_remaining = match (st.state, st.opened_at) {
            (CircuitState::Open, Some(opened_at)) => {
                Some(self.config.recovery.saturating_sub(opened_at.elapsed()))
            }
            _ => None,
        };
        BreakerSnapshot {
            state: st.state,
            failure_count: st.failure_count,
            failure_threshold: self.config.failure_threshold,
            open_remaining,
        }
    }

    // The state is always left consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
