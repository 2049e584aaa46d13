// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One breaker per backend, created at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use fasal_core::Engine;

use crate::breaker::{BreakerConfig, BreakerSnapshot, CircuitBreaker};

/// Owns the circuit breakers of all breaker-gated backends.
#[derive(Debug, Clone, Default)]
pub struct BreakerRegistry {
    breakers: BTreeMap<Engine, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    /// Creates a registry with a fresh breaker for every engine in `engines`.
    pub fn new(config: BreakerConfig, engines: impl IntoIterator<Item = Engine>) -> Self {
        let breakers = engines
            .into_iter()
            .map(|engine| {
                let breaker = CircuitBreaker::new(engine.to_string(), config);
                (engine, Arc::new(breaker))
            })
            .collect();
        Self { breakers }
    }

    /// Returns the breaker for `engine`, creating none.
    pub fn get(&self, engine: Engine) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(&engine).cloned()
    }

    /// Snapshots of every breaker, in chain order.
    pub fn snapshots(&self) -> Vec<(Engine, BreakerSnapshot)> {
        self.breakers
            .iter()
            .map(|(engine, breaker)| (*engine, breaker.snapshot()))
            .collect()
    }
}
