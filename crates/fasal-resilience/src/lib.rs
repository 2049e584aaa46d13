// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failure isolation for unreliable diagnosis backends.
//!
//! A [`CircuitBreaker`] gates calls to one backend: after a configured number
//! of consecutive failures it stops letting calls through until a cool-down
//! has passed. The [`BreakerRegistry`] owns one breaker per backend identity
//! for the lifetime of the process.

pub mod breaker;
pub mod registry;

pub use breaker::{BreakerConfig, BreakerSnapshot, BreakerState, CircuitBreaker};
pub use registry::BreakerRegistry;
