// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock diagnosis backend for deterministic testing.
//!
//! `MockBackend` implements `DiagnosisBackend` with pre-configured outcomes,
//! so fallback and breaker behaviour can be driven without HTTP.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use fasal_core::{DiagnosisBackend, DiagnosisCandidate, Engine, FasalError, ImagePayload, Severity};

/// What a single `diagnose` call does.
#[derive(Debug, Clone)]
pub enum Outcome {
    Succeed(DiagnosisCandidate),
    Fail(String),
    /// Answers with the candidate after the delay.
    Delay(Duration, DiagnosisCandidate),
    /// Never answers; exercises the caller's timeout.
    Hang,
    /// Panics inside the call.
    Panic,
}

/// A backend that plays back scripted outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty the
/// `otherwise` outcome is repeated.
pub struct MockBackend {
    engine: Engine,
    script: Mutex<VecDeque<Outcome>>,
    otherwise: Outcome,
    calls: Arc<AtomicUsize>,
    finished: AtomicUsize,
    hints: Mutex<Vec<Option<String>>>,
}

impl MockBackend {
    pub fn new(engine: Engine, script: Vec<Outcome>, otherwise: Outcome) -> Self {
        Self {
            engine,
            script: Mutex::new(VecDeque::from(script)),
            otherwise,
            calls: Arc::new(AtomicUsize::new(0)),
            finished: AtomicUsize::new(0),
            hints: Mutex::new(Vec::new()),
        }
    }

    /// Always succeeds with `candidate`.
    pub fn succeeding(engine: Engine, candidate: DiagnosisCandidate) -> Self {
        Self::new(engine, Vec::new(), Outcome::Succeed(candidate))
    }

    /// Always fails.
    pub fn failing(engine: Engine) -> Self {
        Self::new(engine, Vec::new(), Outcome::Fail("scripted failure".into()))
    }

    /// Succeeds with `candidate` after `delay`.
    pub fn slow(engine: Engine, delay: Duration, candidate: DiagnosisCandidate) -> Self {
        Self::new(engine, Vec::new(), Outcome::Delay(delay, candidate))
    }

    /// Panics on every call.
    pub fn panicking(engine: Engine) -> Self {
        Self::new(engine, Vec::new(), Outcome::Panic)
    }

    /// Never answers.
    pub fn hanging(engine: Engine) -> Self {
        Self::new(engine, Vec::new(), Outcome::Hang)
    }

    /// Number of `diagnose` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of `diagnose` calls that ran to completion.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// Crop hints received, in call order.
    pub async fn hints(&self) -> Vec<Option<String>> {
        self.hints.lock().await.clone()
    }
}

#[async_trait]
impl DiagnosisBackend for MockBackend {
    fn engine(&self) -> Engine {
        self.engine
    }

    async fn diagnose(
        &self,
        _image: &ImagePayload,
        crop_hint: Option<&str>,
    ) -> Result<DiagnosisCandidate, FasalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.hints.lock().await.push(crop_hint.map(str::to_string));

        let outcome = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.otherwise.clone());

        let result = match outcome {
            Outcome::Succeed(mut candidate) => {
                candidate.engine = self.engine;
                Ok(candidate)
            }
            Outcome::Delay(delay, mut candidate) => {
                tokio::time::sleep(delay).await;
                candidate.engine = self.engine;
                Ok(candidate)
            }
            Outcome::Fail(message) => Err(FasalError::backend(self.engine, message)),
            Outcome::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(FasalError::backend(self.engine, "woke from hang"))
            }
            Outcome::Panic => panic!("scripted panic in {} backend", self.engine),
        };
        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// A plausible diseased candidate for `crop` and `disease_key`.
pub fn sample_candidate(engine: Engine, crop: &str, disease_key: &str) -> DiagnosisCandidate {
    DiagnosisCandidate {
        crop: crop.to_string(),
        disease_key: disease_key.to_string(),
        disease_name: disease_key.replace('_', " "),
        cause: "fungal".into(),
        confidence: 88,
        severity: Severity::Moderate,
        is_healthy: false,
        symptoms_observed: vec!["brown lesions".into()],
        affected_area_percent: 30,
        spread_risk: "moderate".into(),
        immediate_action_needed: true,
        notes: String::new(),
        engine,
        engine_meta: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ImagePayload {
        ImagePayload::new(vec![1, 2, 3], "image/jpeg", "web")
    }

    #[tokio::test]
    async fn scripted_outcomes_play_in_order_then_repeat_default() {
        let backend = MockBackend::new(
            Engine::PrimaryVision,
            vec![Outcome::Fail("boom".into())],
            Outcome::Succeed(sample_candidate(Engine::LabelDetector, "rice", "rice_blast")),
        );

        assert!(backend.diagnose(&image(), None).await.is_err());
        let ok = backend.diagnose(&image(), Some("rice")).await.unwrap();
        assert_eq!(ok.engine, Engine::PrimaryVision, "engine is stamped by the mock");
        assert!(backend.diagnose(&image(), None).await.is_ok());

        assert_eq!(backend.calls(), 3);
        assert_eq!(backend.hints().await[1].as_deref(), Some("rice"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_backend_never_returns_within_a_timeout() {
        let backend = MockBackend::hanging(Engine::LabelDetector);
        let result =
            tokio::time::timeout(Duration::from_secs(5), backend.diagnose(&image(), None)).await;
        assert!(result.is_err());
        assert_eq!(backend.calls(), 1);
    }
}
