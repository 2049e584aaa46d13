// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vision-model diagnosis backend.
//!
//! Sends the leaf photo with a structured instruction to a vision-capable
//! model and converts the JSON it answers with into a
//! [`DiagnosisCandidate`].

pub mod client;
pub mod extract;
pub mod types;

use async_trait::async_trait;
use base64::Engine as _;
use fasal_config::model::VisionConfig;
use fasal_core::{
    DiagnosisBackend, DiagnosisCandidate, Engine, FasalError, ImagePayload, KnowledgeBase,
    Severity, HEALTHY_KEY,
};
use serde_json::json;
use tracing::{debug, info};

use crate::client::VisionClient;
use crate::extract::extract_json;
use crate::types::{ApiContentBlock, ApiMessage, ImageSource, MessageRequest, VisionAnswer};

/// Media types the Messages API accepts inline.
const SUPPORTED_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Primary diagnosis backend backed by a vision model.
#[derive(Debug, Clone)]
pub struct VisionBackend {
    client: VisionClient,
    model: String,
    max_tokens: u32,
    disease_keys: Vec<String>,
}

impl VisionBackend {
    /// Creates the backend. The knowledge base supplies the disease keys the
    /// model is asked to choose from.
    pub fn new(config: &VisionConfig, kb: &dyn KnowledgeBase) -> Result<Self, FasalError> {
        Ok(Self {
            client: VisionClient::new(config)?,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            disease_keys: kb.records().iter().map(|r| r.key.clone()).collect(),
        })
    }

    fn build_request(&self, image: &ImagePayload, crop_hint: Option<&str>) -> MessageRequest {
        let media_type = if SUPPORTED_MEDIA_TYPES.contains(&image.media_type.as_str()) {
            image.media_type.clone()
        } else {
            "image/jpeg".to_string()
        };
        let data = base64::engine::general_purpose::STANDARD.encode(&image.bytes);

        MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![ApiMessage {
                role: "user".into(),
                content: vec![
                    ApiContentBlock::Image {
                        source: ImageSource {
                            source_type: "base64".into(),
                            media_type,
                            data,
                        },
                    },
                    ApiContentBlock::Text {
                        text: diagnosis_prompt(&self.disease_keys, crop_hint),
                    },
                ],
            }],
        }
    }
}

#[async_trait]
impl DiagnosisBackend for VisionBackend {
    fn engine(&self) -> Engine {
        Engine::PrimaryVision
    }

    async fn diagnose(
        &self,
        image: &ImagePayload,
        crop_hint: Option<&str>,
    ) -> Result<DiagnosisCandidate, FasalError> {
        let request = self.build_request(image, crop_hint);
        let (response, auth) = self.client.complete_message(&request).await?;

        let text = response.text();
        debug!(chars = text.len(), stop_reason = ?response.stop_reason, "model replied");

        let value = extract_json(&text).ok_or_else(|| {
            FasalError::backend(Engine::PrimaryVision, "no JSON object in model reply")
        })?;
        let answer: VisionAnswer =
            serde_json::from_value(value).map_err(|e| FasalError::Backend {
                engine: Engine::PrimaryVision,
                message: format!("model reply does not match the diagnosis schema: {e}"),
                source: Some(Box::new(e)),
            })?;

        let mut candidate = candidate_from_answer(answer);
        candidate.engine_meta.insert("model".into(), json!(response.model));
        candidate.engine_meta.insert("auth".into(), json!(auth));
        candidate
            .engine_meta
            .insert("input_tokens".into(), json!(response.usage.input_tokens));
        candidate
            .engine_meta
            .insert("output_tokens".into(), json!(response.usage.output_tokens));

        info!(
            disease = %candidate.disease_key,
            confidence = candidate.confidence,
            auth,
            "vision diagnosis complete"
        );
        Ok(candidate)
    }
}

/// Converts the model's answer into the common candidate shape.
pub fn candidate_from_answer(answer: VisionAnswer) -> DiagnosisCandidate {
    let is_healthy = answer.is_healthy || answer.disease_key == HEALTHY_KEY;
    let severity = if is_healthy {
        Severity::None
    } else {
        Severity::from_label(&answer.severity)
    };

    DiagnosisCandidate {
        crop: non_empty_or(answer.crop, "unknown"),
        disease_key: non_empty_or(answer.disease_key, "unknown").to_lowercase(),
        disease_name: answer.disease_name,
        cause: answer.disease_cause,
        confidence: percent(answer.confidence),
        severity,
        is_healthy,
        symptoms_observed: answer.symptoms_observed,
        affected_area_percent: percent_of_area(answer.affected_area_percent),
        spread_risk: non_empty_or(answer.spread_risk, "unknown"),
        immediate_action_needed: answer.immediate_action_needed,
        notes: answer.additional_notes,
        engine: Engine::PrimaryVision,
        engine_meta: Default::default(),
    }
}

/// Confidence as 0..=100; fractions up to 1.0 are scaled.
fn percent(raw: f64) -> u8 {
    let scaled = if raw > 0.0 && raw <= 1.0 { raw * 100.0 } else { raw };
    scaled.round().clamp(0.0, 100.0) as u8
}

fn percent_of_area(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

fn diagnosis_prompt(disease_keys: &[String], crop_hint: Option<&str>) -> String {
    let hint = crop_hint
        .filter(|c| !c.trim().is_empty())
        .map(|c| format!("The farmer says this crop is: {}.\n", c.trim()))
        .unwrap_or_default();

    format!(
        "You are an expert plant pathologist helping Indian farmers. Examine this crop photo \
and identify any disease.\n{hint}\
Known disease keys: {keys}. Use one of them when it matches; otherwise use a short snake_case key.\n\
Respond with ONLY a JSON object with these keys:\n\
{{\n\
  \"crop\": \"crop name\",\n\
  \"is_healthy\": true or false,\n\
  \"disease_key\": \"key\",\n\
  \"disease_name\": \"common name\",\n\
  \"disease_cause\": \"fungal | bacterial | viral | pest | nutrient | none\",\n\
  \"confidence\": 0-100,\n\
  \"severity\": \"none | mild | moderate | severe\",\n\
  \"symptoms_observed\": [\"...\"],\n\
  \"affected_area_percent\": 0-100,\n\
  \"spread_risk\": \"low | moderate | high\",\n\
  \"immediate_action_needed\": true or false,\n\
  \"additional_notes\": \"...\"\n\
}}",
        keys = disease_keys.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fasal_knowledge::StaticKnowledgeBase;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> VisionBackend {
        let config = VisionConfig {
            api_key: Some("k".into()),
            base_url: server.uri(),
            ..VisionConfig::default()
        };
        let kb = StaticKnowledgeBase::builtin().unwrap();
        VisionBackend::new(&config, &kb).unwrap()
    }

    fn reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "content": [{"type": "text", "text": text}],
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 1500, "output_tokens": 200}
        }))
    }

    fn image() -> ImagePayload {
        ImagePayload::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg", "web")
    }

    #[tokio::test]
    async fn fenced_reply_becomes_candidate() {
        let server = MockServer::start().await;
        let answer = r#"Sure! ```json
{"crop": "Tomato", "is_healthy": false, "disease_key": "tomato_early_blight",
 "disease_name": "Early Blight", "disease_cause": "fungal", "confidence": 0.91,
 "severity": "moderate", "symptoms_observed": ["concentric rings"],
 "affected_area_percent": 25, "spread_risk": "high",
 "immediate_action_needed": true, "additional_notes": "Lower leaves affected"}
```"#;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(reply(answer))
            .mount(&server)
            .await;

        let candidate = backend(&server).diagnose(&image(), None).await.unwrap();
        assert_eq!(candidate.engine, Engine::PrimaryVision);
        assert_eq!(candidate.disease_key, "tomato_early_blight");
        assert_eq!(candidate.confidence, 91);
        assert_eq!(candidate.severity, Severity::Moderate);
        assert_eq!(candidate.affected_area_percent, 25);
        assert_eq!(candidate.engine_meta["auth"], "api_key");
        assert_eq!(candidate.engine_meta["input_tokens"], 1500);
    }

    #[tokio::test]
    async fn request_carries_image_and_crop_hint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_partial_json(json!({
                "messages": [{"role": "user", "content": [
                    {"type": "image", "source": {"type": "base64", "media_type": "image/jpeg", "data": "/9j/"}}
                ]}]
            })))
            .respond_with(reply(r#"{"crop": "rice", "is_healthy": true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend(&server);
        let request = backend.build_request(&image(), Some("rice"));
        let ApiContentBlock::Text { text } = &request.messages[0].content[1] else {
            panic!("second block should be the instruction");
        };
        assert!(text.contains("The farmer says this crop is: rice."));
        assert!(text.contains("rice_blast"));

        let candidate = backend.diagnose(&image(), Some("rice")).await.unwrap();
        assert!(candidate.is_healthy);
        assert_eq!(candidate.severity, Severity::None);
    }

    #[tokio::test]
    async fn prose_without_json_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(reply("I can't tell what plant this is."))
            .mount(&server)
            .await;

        let err = backend(&server).diagnose(&image(), None).await.unwrap_err();
        assert!(matches!(
            err,
            FasalError::Backend {
                engine: Engine::PrimaryVision,
                ..
            }
        ));
    }

    #[test]
    fn candidate_normalizes_fields() {
        let candidate = candidate_from_answer(VisionAnswer {
            disease_key: "Rice_Sheath_Blight".into(),
            confidence: 140.0,
            affected_area_percent: -3.0,
            severity: "critical".into(),
            ..VisionAnswer::default()
        });
        assert_eq!(candidate.disease_key, "rice_sheath_blight");
        assert_eq!(candidate.crop, "unknown");
        assert_eq!(candidate.confidence, 100);
        assert_eq!(candidate.affected_area_percent, 0);
        assert_eq!(candidate.severity, Severity::Severe);
    }
}
