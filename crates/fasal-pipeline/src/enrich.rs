// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge-base enrichment.
//!
//! Resolves the candidate's disease key to a record. Unknown keys fall back to
//! the first listed disease of the identified crop, then to the healthy
//! record. The returned diagnosis always carries a key that resolves.

use fasal_core::{DiagnosisCandidate, DiseaseRecord, KnowledgeBase};
use serde::Serialize;
use tracing::debug;

/// A diagnosis merged with its knowledge-base record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedResult {
    pub diagnosis: DiagnosisCandidate,
    pub record: DiseaseRecord,
}

/// Merges `candidate` with the knowledge base. Idempotent: enriching
/// `result.diagnosis` again yields the same result.
pub fn enrich(
    candidate: &DiagnosisCandidate,
    kb: &dyn KnowledgeBase,
    crop_hint: Option<&str>,
) -> EnrichedResult {
    let reported_crop = candidate.crop.trim().to_lowercase();
    let crop = match kb.crop(&reported_crop) {
        Some(info) => info.key.clone(),
        None => crop_hint
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .map(|h| kb.crop(&h).map(|info| info.key.clone()).unwrap_or(h))
            .unwrap_or(reported_crop),
    };

    let record = if candidate.is_healthy {
        kb.healthy()
    } else if let Some(record) = kb.get(&candidate.disease_key) {
        record
    } else if let Some(record) = kb.crop_diseases(&crop).first().and_then(|k| kb.get(k)) {
        debug!(
            reported = %candidate.disease_key,
            mapped = %record.key,
            %crop,
            "unknown disease mapped to crop default"
        );
        record
    } else {
        debug!(reported = %candidate.disease_key, %crop, "unknown disease and crop, using healthy record");
        kb.healthy()
    };

    let mut diagnosis = candidate.clone();
    diagnosis.crop = if crop.is_empty() {
        record.crop.to_lowercase()
    } else {
        crop
    };
    diagnosis.disease_key.clone_from(&record.key);

    EnrichedResult {
        diagnosis,
        record: record.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fasal_core::{Engine, HEALTHY_KEY};
    use fasal_knowledge::StaticKnowledgeBase;
    use fasal_test_utils::sample_candidate;

    fn kb() -> StaticKnowledgeBase {
        StaticKnowledgeBase::builtin().unwrap()
    }

    #[test]
    fn known_key_is_used_directly() {
        let c = sample_candidate(Engine::PrimaryVision, "tomato", "tomato_late_blight");
        let result = enrich(&c, &kb(), None);
        assert_eq!(result.record.key, "tomato_late_blight");
        assert_eq!(result.diagnosis.disease_key, "tomato_late_blight");
        assert_eq!(result.diagnosis.confidence, c.confidence);
    }

    #[test]
    fn unknown_rice_disease_maps_to_first_rice_disease() {
        let c = sample_candidate(Engine::PrimaryVision, "Rice", "rice_sheath_blight");
        let result = enrich(&c, &kb(), None);
        assert_eq!(result.record.key, "rice_blast");
        assert_eq!(result.diagnosis.disease_key, "rice_blast");
        assert_eq!(result.diagnosis.crop, "rice");
    }

    #[test]
    fn unknown_crop_falls_back_to_healthy_record() {
        let c = sample_candidate(Engine::LabelDetector, "banana", "unknown_disease");
        let result = enrich(&c, &kb(), None);
        assert_eq!(result.record.key, HEALTHY_KEY);
        assert_eq!(result.diagnosis.crop, "banana");
    }

    #[test]
    fn crop_hint_substitutes_for_unrecognized_crop() {
        let c = sample_candidate(Engine::LabelDetector, "unknown", "unknown_disease");
        let result = enrich(&c, &kb(), Some("Wheat"));
        assert_eq!(result.record.key, "wheat_leaf_rust");
        assert_eq!(result.diagnosis.crop, "wheat");

        let recognized = sample_candidate(Engine::LabelDetector, "potato", "unknown_disease");
        let result = enrich(&recognized, &kb(), Some("wheat"));
        assert_eq!(result.record.key, "potato_late_blight", "hint only fills in for unknown crops");
    }

    #[test]
    fn healthy_candidate_is_forced_to_healthy_record() {
        let mut c = sample_candidate(Engine::PrimaryVision, "tomato", "tomato_early_blight");
        c.is_healthy = true;
        let result = enrich(&c, &kb(), None);
        assert_eq!(result.record.key, HEALTHY_KEY);
        assert_eq!(result.diagnosis.disease_key, HEALTHY_KEY);
    }

    #[test]
    fn enrichment_is_idempotent() {
        let kb = kb();
        let cases = [
            sample_candidate(Engine::PrimaryVision, "rice", "rice_brown_spot"),
            sample_candidate(Engine::PrimaryVision, "rice", "no_such_disease"),
            sample_candidate(Engine::LabelDetector, "unknown", "unknown_disease"),
            sample_candidate(Engine::LabelDetector, "okra", "yellow_vein_mosaic"),
        ];
        for c in cases {
            let once = enrich(&c, &kb, Some("cotton"));
            let twice = enrich(&once.diagnosis, &kb, Some("cotton"));
            assert_eq!(once, twice);
            assert!(kb.get(&once.diagnosis.disease_key).is_some());
        }
    }
}
