// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for FasalDrishti integration tests.
//!
//! Provides scripted implementations of the core traits for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockBackend`] - Diagnosis backend with a queue of scripted outcomes
//! - [`MockTranslator`] - Translator that tags text with the target language
//! - [`MockFetcher`] - Media fetcher returning fixed bytes or failing

pub mod mock_backend;
pub mod mock_fetcher;
pub mod mock_translator;

pub use mock_backend::{MockBackend, Outcome, sample_candidate};
pub use mock_fetcher::MockFetcher;
pub use mock_translator::MockTranslator;
