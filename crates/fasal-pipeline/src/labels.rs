// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic label-detection backend (Cloud Vision `images:annotate`).
//!
//! The detector knows nothing about plant disease. Its labels are mapped to
//! a crop by substring and to a coarse diagnosis by the presence of
//! damage-indicating words.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use fasal_config::model::LabelsConfig;
use fasal_core::{
    DiagnosisBackend, DiagnosisCandidate, Engine, FasalError, HEALTHY_KEY, ImagePayload,
    KnowledgeBase, Severity,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

/// Crop keywords in priority order. A label naming any keyword selects the crop.
const CROP_KEYWORDS: &[(&str, &[&str])] = &[
    ("tomato", &["tomato", "solanum"]),
    ("rice", &["rice", "paddy"]),
    ("wheat", &["wheat", "cereal"]),
    ("cotton", &["cotton"]),
    ("potato", &["potato"]),
    ("chili", &["chili", "pepper", "capsicum"]),
    ("onion", &["onion", "allium"]),
    ("maize", &["corn", "maize"]),
    ("sugarcane", &["sugarcane"]),
    ("soybean", &["soybean", "soy"]),
];

const DISEASE_INDICATORS: &[&str] = &[
    "spot",
    "blight",
    "rust",
    "mold",
    "wilt",
    "rot",
    "fungus",
    "lesion",
    "discoloration",
    "yellowing",
    "browning",
    "damage",
    "insect",
    "pest",
    "mildew",
    "necrosis",
];

/// Labels that show a plant is in frame even when no crop is recognized.
const PLANT_LABELS: &[&str] = &["plant", "leaf", "vegetation", "flora", "flower", "fruit"];

const HEALTHY_CONFIDENCE: u8 = 75;
const CROP_DISEASE_CONFIDENCE: u8 = 65;
const UNKNOWN_DISEASE_CONFIDENCE: u8 = 55;

/// One label returned by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub description: String,
    #[serde(default)]
    pub score: f32,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResult {
    #[serde(default)]
    label_annotations: Vec<Label>,
    #[serde(default)]
    error: Option<AnnotateError>,
}

#[derive(Debug, Deserialize)]
struct AnnotateError {
    #[serde(default)]
    message: String,
}

/// Backend that diagnoses from generic image labels.
pub struct LabelDetector {
    client: reqwest::Client,
    url: String,
    max_labels: u32,
    min_score: f32,
    kb: Arc<dyn KnowledgeBase>,
}

impl LabelDetector {
    pub fn new(config: &LabelsConfig, kb: Arc<dyn KnowledgeBase>) -> Result<Self, FasalError> {
        let key = config
            .api_key
            .as_deref()
            .ok_or_else(|| FasalError::Config("label detector needs labels.api_key".into()))?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| FasalError::Backend {
                engine: Engine::LabelDetector,
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            url: format!("{}?key={key}", config.endpoint),
            max_labels: config.max_labels,
            min_score: config.min_score,
            kb,
        })
    }

    async fn detect(&self, image: &ImagePayload) -> Result<Vec<Label>, FasalError> {
        let body = json!({
            "requests": [{
                "image": {"content": base64::engine::general_purpose::STANDARD.encode(&image.bytes)},
                "features": [{"type": "LABEL_DETECTION", "maxResults": self.max_labels}]
            }]
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FasalError::Backend {
                engine: Engine::LabelDetector,
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FasalError::backend(
                Engine::LabelDetector,
                format!("label API returned {status}: {text}"),
            ));
        }

        let parsed: AnnotateResponse = response.json().await.map_err(|e| FasalError::Backend {
            engine: Engine::LabelDetector,
            message: format!("failed to parse label response: {e}"),
            source: Some(Box::new(e)),
        })?;

        let result = parsed.responses.into_iter().next().ok_or_else(|| {
            FasalError::backend(Engine::LabelDetector, "label response had no results")
        })?;
        if let Some(err) = result.error {
            return Err(FasalError::backend(
                Engine::LabelDetector,
                format!("label API error: {}", err.message),
            ));
        }

        Ok(result
            .label_annotations
            .into_iter()
            .filter(|l| l.score >= self.min_score)
            .map(|l| Label {
                description: l.description.to_lowercase(),
                score: l.score,
            })
            .collect())
    }
}

#[async_trait]
impl DiagnosisBackend for LabelDetector {
    fn engine(&self) -> Engine {
        Engine::LabelDetector
    }

    async fn diagnose(
        &self,
        image: &ImagePayload,
        _crop_hint: Option<&str>,
    ) -> Result<DiagnosisCandidate, FasalError> {
        let labels = self.detect(image).await?;
        debug!(count = labels.len(), "labels detected");
        let candidate = classify_labels(&labels, self.kb.as_ref())?;
        info!(
            crop = %candidate.crop,
            disease = %candidate.disease_key,
            confidence = candidate.confidence,
            "label diagnosis complete"
        );
        Ok(candidate)
    }
}

/// Maps detector labels to the first crop whose keyword appears in any label.
pub fn identify_crop(labels: &[Label]) -> Option<&'static str> {
    CROP_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|kw| labels.iter().any(|l| l.description.contains(kw)))
        })
        .map(|(crop, _)| *crop)
}

/// Labels containing a damage-indicating word.
fn indicator_labels(labels: &[Label]) -> Vec<String> {
    labels
        .iter()
        .filter(|l| {
            l.description
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| DISEASE_INDICATORS.contains(&word))
        })
        .map(|l| l.description.clone())
        .collect()
}

/// Whether any label is exactly one of the generic plant labels.
fn shows_a_plant(labels: &[Label]) -> bool {
    labels
        .iter()
        .any(|l| PLANT_LABELS.contains(&l.description.as_str()))
}

/// Turns a label set into a candidate.
///
/// Fails when the labels show neither a known crop nor a plant, so the
/// chain moves on instead of calling a non-plant photo healthy.
pub fn classify_labels(
    labels: &[Label],
    kb: &dyn KnowledgeBase,
) -> Result<DiagnosisCandidate, FasalError> {
    let crop = identify_crop(labels);
    if crop.is_none() && !shows_a_plant(labels) {
        return Err(FasalError::backend(
            Engine::LabelDetector,
            "no crop or plant in the detected labels",
        ));
    }
    let indicators = indicator_labels(labels);
    let seen: Vec<&str> = labels.iter().take(8).map(|l| l.description.as_str()).collect();

    let (disease_key, disease_name, confidence) = if indicators.is_empty() {
        (
            HEALTHY_KEY.to_string(),
            "Healthy Plant".to_string(),
            HEALTHY_CONFIDENCE,
        )
    } else {
        let first = crop
            .and_then(|c| kb.crop_diseases(c).first())
            .and_then(|key| kb.get(key));
        match first {
            Some(record) => (
                record.key.clone(),
                record.disease_name.clone(),
                CROP_DISEASE_CONFIDENCE,
            ),
            None => (
                "unknown_disease".to_string(),
                "Possible Disease Detected".to_string(),
                UNKNOWN_DISEASE_CONFIDENCE,
            ),
        }
    };
    let is_healthy = disease_key == HEALTHY_KEY;

    let mut engine_meta = serde_json::Map::new();
    engine_meta.insert("labels".into(), json!(labels));

    Ok(DiagnosisCandidate {
        crop: crop.unwrap_or("unknown").to_string(),
        disease_key,
        disease_name,
        cause: "unknown".into(),
        confidence,
        severity: if is_healthy {
            Severity::None
        } else {
            Severity::Moderate
        },
        is_healthy,
        symptoms_observed: indicators,
        affected_area_percent: 0,
        spread_risk: "unknown".into(),
        immediate_action_needed: !is_healthy,
        notes: format!("Identified via label detection. Labels: {}", seen.join(", ")),
        engine: Engine::LabelDetector,
        engine_meta,
    })
}
