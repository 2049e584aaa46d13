// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered, breaker-gated fallback across diagnosis backends.
//!
//! Each backend is tried once, in order, behind its own circuit breaker and
//! a wall-clock timeout. The static fallback ends the chain and is not
//! gated, so a diagnosis is always produced.

use std::sync::Arc;
use std::time::Duration;

use fasal_core::{DiagnosisBackend, DiagnosisCandidate, Engine, FasalError, ImagePayload};
use fasal_resilience::{BreakerConfig, BreakerRegistry, CircuitBreaker};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::fallback::StaticFallback;

/// What happened to one backend during a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    SkippedByBreaker,
    Failed { reason: String },
    Succeeded,
}

/// Audit record for one backend in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub engine: Engine,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
    pub latency_ms: u64,
}

struct Step {
    backend: Arc<dyn DiagnosisBackend>,
    breaker: Arc<CircuitBreaker>,
}

/// The backend chain with one breaker per gated backend.
pub struct FallbackChain {
    steps: Vec<Step>,
    terminal: StaticFallback,
    registry: BreakerRegistry,
    timeout: Duration,
}

impl FallbackChain {
    /// Builds a chain over `backends` in the given order, creating a fresh
    /// breaker for each.
    pub fn new(
        backends: Vec<Arc<dyn DiagnosisBackend>>,
        terminal: StaticFallback,
        breaker: BreakerConfig,
        timeout: Duration,
    ) -> Self {
        let registry = BreakerRegistry::new(breaker, backends.iter().map(|b| b.engine()));
        let steps = backends
            .into_iter()
            .filter_map(|backend| {
                let breaker = registry.get(backend.engine())?;
                Some(Step { backend, breaker })
            })
            .collect();
        Self {
            steps,
            terminal,
            registry,
            timeout,
        }
    }

    pub fn registry(&self) -> &BreakerRegistry {
        &self.registry
    }

    /// Engines in the order they are tried, terminal included.
    pub fn engines(&self) -> Vec<Engine> {
        self.steps
            .iter()
            .map(|s| s.backend.engine())
            .chain(std::iter::once(Engine::StaticFallback))
            .collect()
    }

    /// Runs the chain. Always yields a candidate plus one attempt record per
    /// backend considered.
    pub async fn diagnose(
        &self,
        image: &ImagePayload,
        crop_hint: Option<&str>,
    ) -> (DiagnosisCandidate, Vec<Attempt>) {
        let mut attempts = Vec::with_capacity(self.steps.len() + 1);

        for step in &self.steps {
            let engine = step.backend.engine();
            if !step.breaker.allow() {
                debug!(%engine, "breaker open, skipping backend");
                attempts.push(Attempt {
                    engine,
                    outcome: AttemptOutcome::SkippedByBreaker,
                    latency_ms: 0,
                });
                continue;
            }

            let started = Instant::now();
            let result = match tokio::time::timeout(
                self.timeout,
                step.backend.diagnose(image, crop_hint),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(FasalError::Timeout {
                    duration: self.timeout,
                }),
            };
            let latency_ms = elapsed_ms(started);

            match result {
                Ok(candidate) => {
                    step.breaker.record_success();
                    info!(%engine, latency_ms, "backend produced a diagnosis");
                    attempts.push(Attempt {
                        engine,
                        outcome: AttemptOutcome::Succeeded,
                        latency_ms,
                    });
                    return (candidate, attempts);
                }
                Err(e) => {
                    step.breaker.record_failure();
                    warn!(%engine, latency_ms, error = %e, "backend failed, trying next");
                    attempts.push(Attempt {
                        engine,
                        outcome: AttemptOutcome::Failed {
                            reason: e.to_string(),
                        },
                        latency_ms,
                    });
                }
            }
        }

        let started = Instant::now();
        let candidate = self.terminal.pick();
        info!("all gated backends unavailable, using static fallback");
        attempts.push(Attempt {
            engine: Engine::StaticFallback,
            outcome: AttemptOutcome::Succeeded,
            latency_ms: elapsed_ms(started),
        });
        (candidate, attempts)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
