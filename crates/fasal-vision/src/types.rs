// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messages API request/response types and the diagnosis schema the model answers with.

use serde::{Deserialize, Serialize};

// --- Request types ---

/// A request to the Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    pub model: String,
    pub messages: Vec<ApiMessage>,
    pub max_tokens: u32,
}

/// A single conversation turn.
#[derive(Debug, Clone, Serialize)]
pub struct ApiMessage {
    /// "user" or "assistant".
    pub role: String,
    pub content: Vec<ApiContentBlock>,
}

/// A typed content block within a message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ApiContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    /// Inline base64 image.
    #[serde(rename = "image")]
    Image { source: ImageSource },
}

/// Source data for an image content block.
#[derive(Debug, Clone, Serialize)]
pub struct ImageSource {
    /// Always "base64" for inline images.
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

// --- Response types ---

/// A full (non-streaming) response.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub content: Vec<ResponseContentBlock>,
    pub model: String,
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: ApiUsage,
}

impl MessageResponse {
    /// All text blocks joined, in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(text.as_str()),
                ResponseContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A content block in a response. Only text is used.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(rename = "type")]
    pub type_: String,
    pub message: String,
}

// --- Diagnosis schema ---

/// The JSON object the model is instructed to return.
///
/// Every field is optional on the wire; models drop keys they consider
/// irrelevant (no symptoms on a healthy leaf, for example).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VisionAnswer {
    pub crop: String,
    pub is_healthy: bool,
    pub disease_key: String,
    pub disease_name: String,
    pub disease_cause: String,
    /// Either a percentage or a 0..1 fraction.
    #[serde(deserialize_with = "lenient_number")]
    pub confidence: f64,
    pub severity: String,
    pub symptoms_observed: Vec<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub affected_area_percent: f64,
    pub spread_risk: String,
    pub immediate_action_needed: bool,
    pub additional_notes: String,
}

/// Accepts `85`, `85.5`, `"85"` or `"85%"`; anything else reads as zero.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}
