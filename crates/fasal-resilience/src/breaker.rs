// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consecutive-failure circuit breaker.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Thresholds for a single breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures that open the breaker.
    pub failure_threshold: u32,
    /// Time after the last failure before a trial call is let through.
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 2,
            cooldown: Duration::from_secs(300),
        }
    }
}

/// Externally visible breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    /// Calls flow normally.
    Closed,
    /// Calls are rejected until the cool-down elapses.
    Open,
    /// A trial call has been let through after the cool-down; one more
    /// failure reopens the breaker.
    HalfOpen,
}

/// Point-in-time view of a breaker, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub seconds_since_last_failure: Option<u64>,
}

#[derive(Debug, Default)]
struct CircuitState {
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    open: bool,
    trial: bool,
}

/// Gate in front of one unreliable backend.
///
/// All methods take `&self`; state is behind a mutex so the breaker can be
/// shared across concurrent requests.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    state: Mutex<CircuitState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Mutex::new(CircuitState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether a call may be attempted now.
    ///
    /// An open breaker whose cool-down has elapsed resets to closed with the
    /// counter zeroed and lets one trial call through.
    pub fn allow(&self) -> bool {
        let mut state = self.lock();
        if !state.open {
            return true;
        }
        let cooled_down = state
            .last_failure
            .is_none_or(|at| at.elapsed() >= self.config.cooldown);
        if cooled_down {
            state.open = false;
            state.consecutive_failures = 0;
            state.trial = true;
            debug!(breaker = %self.name, "cool-down elapsed, allowing trial call");
        }
        cooled_down
    }

    /// Records a successful call: counter to zero, breaker closed.
    pub fn record_success(&self) {
        let mut state = self.lock();
        if state.open || state.trial || state.consecutive_failures > 0 {
            debug!(breaker = %self.name, "closing after success");
        }
        state.consecutive_failures = 0;
        state.open = false;
        state.trial = false;
    }

    /// Records a failed call, opening the breaker at the threshold or when
    /// the failing call was a trial.
    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        state.last_failure = Some(Instant::now());
        let reopen = state.trial || state.consecutive_failures >= self.config.failure_threshold;
        if reopen && !state.open {
            warn!(
                breaker = %self.name,
                failures = state.consecutive_failures,
                cooldown_secs = self.config.cooldown.as_secs(),
                "circuit opened"
            );
        }
        state.open |= reopen;
        state.trial = false;
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let state = self.lock();
        let status = if state.open {
            BreakerState::Open
        } else if state.trial {
            BreakerState::HalfOpen
        } else {
            BreakerState::Closed
        };
        BreakerSnapshot {
            state: status,
            consecutive_failures: state.consecutive_failures,
            seconds_since_last_failure: state.last_failure.map(|at| at.elapsed().as_secs()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CircuitState> {
        // State stays consistent even if a holder panicked: every write is a
        // plain field store.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn breaker(threshold: u32, cooldown_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            BreakerConfig {
                failure_threshold: threshold,
                cooldown: Duration::from_secs(cooldown_secs),
            },
        )
    }

    #[test]
    fn starts_closed() {
        let cb = breaker(2, 300);
        assert!(cb.allow());
        assert_eq!(cb.snapshot().state, BreakerState::Closed);
        assert_eq!(cb.snapshot().seconds_since_last_failure, None);
    }

    #[test]
    fn opens_at_threshold() {
        let cb = breaker(2, 300);
        cb.record_failure();
        assert!(cb.allow());
        cb.record_failure();
        assert!(!cb.allow());
        assert_eq!(cb.snapshot().state, BreakerState::Open);
        assert_eq!(cb.snapshot().consecutive_failures, 2);
    }

    #[test]
    fn success_resets_counter() {
        let cb = breaker(2, 300);
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert!(cb.allow(), "failures are consecutive, not cumulative");
        assert_eq!(cb.snapshot().consecutive_failures, 1);
    }

    #[test]
    fn success_closes_open_breaker() {
        let cb = breaker(1, 300);
        cb.record_failure();
        assert!(!cb.allow());
        cb.record_success();
        assert!(cb.allow());
        assert_eq!(cb.snapshot().state, BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn stays_open_until_cooldown_elapses() {
        let cb = breaker(2, 300);
        cb.record_failure();
        cb.record_failure();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(!cb.allow());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cb.allow());
        let snap = cb.snapshot();
        assert_eq!(snap.state, BreakerState::HalfOpen);
        assert_eq!(snap.consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_trial_reopens_immediately() {
        let cb = breaker(2, 300);
        cb.record_failure();
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(cb.allow());

        cb.record_failure();
        assert!(!cb.allow(), "a single trial failure reopens the breaker");

        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(cb.allow());
        cb.record_success();
        assert_eq!(cb.snapshot().state, BreakerState::Closed);
        cb.record_failure();
        assert!(cb.allow(), "after a successful trial the threshold applies again");
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_counts_from_last_failure() {
        let cb = breaker(2, 300);
        cb.record_failure();
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(200)).await;
        cb.record_failure();
        tokio::time::advance(Duration::from_secs(200)).await;
        assert!(!cb.allow());
        assert_eq!(cb.snapshot().seconds_since_last_failure, Some(200));
    }

    proptest! {
        #[test]
        fn allow_tracks_consecutive_failures(
            threshold in 1u32..6,
            outcomes in proptest::collection::vec(any::<bool>(), 0..40),
        ) {
            let cb = breaker(threshold, 3600);
            let mut failures = 0u32;
            for ok in outcomes {
                prop_assert_eq!(cb.allow(), failures < threshold);
                if ok {
                    cb.record_success();
                    failures = 0;
                } else {
                    cb.record_failure();
                    failures += 1;
                }
            }
            prop_assert_eq!(cb.allow(), failures < threshold);
        }
    }
}
