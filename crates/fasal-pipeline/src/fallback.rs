// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal demo backend. Picks a disease record at random and never fails.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use fasal_core::{
    DiagnosisBackend, DiagnosisCandidate, DiseaseRecord, Engine, FasalError, ImagePayload,
    KnowledgeBase,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;

const DISCLAIMER: &str = "Demo mode: no diagnosis engine was reachable. \
The disease shown is a sample from the knowledge base, not an analysis of this photo.";

pub struct StaticFallback {
    kb: Arc<dyn KnowledgeBase>,
    rng: Mutex<StdRng>,
}

impl StaticFallback {
    pub fn new(kb: Arc<dyn KnowledgeBase>) -> Self {
        Self {
            kb,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic variant for tests.
    pub fn seeded(kb: Arc<dyn KnowledgeBase>, seed: u64) -> Self {
        Self {
            kb,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Produces a demo candidate. Infallible.
    pub fn pick(&self) -> DiagnosisCandidate {
        let records = self.kb.records();
        let diseases: Vec<&DiseaseRecord> =
            records.iter().copied().filter(|r| !r.is_healthy()).collect();

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let record = diseases
            .choose(&mut *rng)
            .copied()
            .unwrap_or_else(|| self.kb.healthy());
        let confidence = rng.gen_range(82..=96);
        let affected_area_percent = rng.gen_range(20..=60);
        drop(rng);

        let mut engine_meta = serde_json::Map::new();
        engine_meta.insert("demo".into(), json!(true));

        DiagnosisCandidate {
            crop: record.crop.to_lowercase(),
            disease_key: record.key.clone(),
            disease_name: record.disease_name.clone(),
            cause: record.category.clone(),
            confidence,
            severity: record.severity_typical,
            is_healthy: record.is_healthy(),
            symptoms_observed: record.symptoms.iter().take(3).cloned().collect(),
            affected_area_percent,
            spread_risk: "moderate".into(),
            immediate_action_needed: !record.is_healthy(),
            notes: DISCLAIMER.into(),
            engine: Engine::StaticFallback,
            engine_meta,
        }
    }
}

#[async_trait]
impl DiagnosisBackend for StaticFallback {
    fn engine(&self) -> Engine {
        Engine::StaticFallback
    }

    async fn diagnose(
        &self,
        _image: &ImagePayload,
        _crop_hint: Option<&str>,
    ) -> Result<DiagnosisCandidate, FasalError> {
        Ok(self.pick())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fasal_knowledge::StaticKnowledgeBase;

    fn kb() -> Arc<dyn KnowledgeBase> {
        Arc::new(StaticKnowledgeBase::builtin().unwrap())
    }

    #[test]
    fn picks_are_within_documented_ranges() {
        let fallback = StaticFallback::seeded(kb(), 7);
        for _ in 0..200 {
            let c = fallback.pick();
            assert!((82..=96).contains(&c.confidence));
            assert!((20..=60).contains(&c.affected_area_percent));
            assert!(!c.is_healthy);
            assert_ne!(c.disease_key, "healthy");
            assert!(c.symptoms_observed.len() <= 3);
            assert_eq!(c.engine, Engine::StaticFallback);
            assert!(c.notes.starts_with("Demo mode"));
            assert_eq!(c.engine_meta["demo"], true);
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let a = StaticFallback::seeded(kb(), 42);
        let b = StaticFallback::seeded(kb(), 42);
        for _ in 0..10 {
            assert_eq!(a.pick(), b.pick());
        }
    }

    #[test]
    fn uses_record_typical_severity() {
        let kb = kb();
        let fallback = StaticFallback::seeded(Arc::clone(&kb), 3);
        let c = fallback.pick();
        let record = kb.get(&c.disease_key).unwrap();
        assert_eq!(c.severity, record.severity_typical);
        assert_eq!(c.crop, record.crop.to_lowercase());
    }
}
