// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline output and its JSON wire shape.

use fasal_core::{Engine, Language, Severity};
use serde::Serialize;

use crate::chain::Attempt;
use crate::enrich::EnrichedResult;
use crate::translate::Localized;

/// Audit trail of one pipeline run. Never read by enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineMetadata {
    pub engine: Engine,
    pub latency_ms: u64,
    pub image_resized: bool,
    pub attempts: Vec<Attempt>,
}

/// Everything one analysis produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub scan_id: String,
    pub language: Language,
    pub result: EnrichedResult,
    pub localized: Localized,
    pub metadata: PipelineMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentView {
    pub name: String,
    pub dosage: String,
    pub application: String,
    pub frequency: String,
    /// Formatted as `₹N/acre`.
    pub cost: String,
}

/// Response body of the analyze endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeResponse {
    pub scan_id: String,
    pub success: bool,
    pub language: Language,
    pub disease: String,
    pub disease_name: String,
    pub localized_name: String,
    pub scientific_name: String,
    pub crop: String,
    pub category: String,
    pub is_healthy: bool,
    /// 0.0..=1.0
    pub confidence: f64,
    pub severity: Severity,
    pub description: String,
    pub symptoms: Vec<String>,
    pub all_symptoms: Vec<String>,
    pub affected_area_percent: u8,
    pub spread_risk: String,
    pub immediate_action_needed: bool,
    pub treatments: Vec<TreatmentView>,
    pub organic_treatments: Vec<String>,
    pub prevention: Vec<String>,
    pub favorable_conditions: String,
    pub analysis_engine: Engine,
    pub pipeline_latency_ms: u64,
    pub image_resized: bool,
    pub ai_notes: String,
    pub attempts: Vec<Attempt>,
}

impl AnalysisReport {
    /// Observed symptoms, or the record's first three when the backend reported none.
    pub fn symptoms(&self) -> Vec<String> {
        let observed = &self.result.diagnosis.symptoms_observed;
        if observed.is_empty() {
            self.result.record.symptoms.iter().take(3).cloned().collect()
        } else {
            observed.clone()
        }
    }

    pub fn to_response(&self) -> AnalyzeResponse {
        let diagnosis = &self.result.diagnosis;
        let record = &self.result.record;
        AnalyzeResponse {
            scan_id: self.scan_id.clone(),
            success: true,
            language: self.language,
            disease: record.key.clone(),
            disease_name: record.disease_name.clone(),
            localized_name: record.local_name(self.language).to_string(),
            scientific_name: record.scientific_name.clone(),
            crop: diagnosis.crop.clone(),
            category: record.category.clone(),
            is_healthy: diagnosis.is_healthy,
            confidence: f64::from(diagnosis.confidence) / 100.0,
            severity: diagnosis.severity,
            description: self.localized.description.clone(),
            symptoms: self.symptoms(),
            all_symptoms: record.symptoms.clone(),
            affected_area_percent: diagnosis.affected_area_percent,
            spread_risk: diagnosis.spread_risk.clone(),
            immediate_action_needed: diagnosis.immediate_action_needed,
            treatments: record
                .treatments
                .iter()
                .map(|t| TreatmentView {
                    name: t.name.clone(),
                    dosage: t.dosage.clone(),
                    application: self.localized.method(&t.method).to_string(),
                    frequency: t.frequency.clone(),
                    cost: format!("₹{}/acre", t.cost_per_acre),
                })
                .collect(),
            organic_treatments: record.organic_treatments.clone(),
            prevention: record.prevention.clone(),
            favorable_conditions: record.favorable_conditions.clone(),
            analysis_engine: self.metadata.engine,
            pipeline_latency_ms: self.metadata.latency_ms,
            image_resized: self.metadata.image_resized,
            ai_notes: diagnosis.notes.clone(),
            attempts: self.metadata.attempts.clone(),
        }
    }
}
