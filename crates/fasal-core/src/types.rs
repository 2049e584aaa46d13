// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the pipeline, the knowledge base and the chat channel.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Key of the canonical "healthy plant" record in every knowledge base.
pub const HEALTHY_KEY: &str = "healthy";

/// Identity of a diagnosis backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    PrimaryVision,
    LabelDetector,
    StaticFallback,
}

impl Engine {
    /// Backends in the order the fallback chain tries them.
    pub const CHAIN: [Engine; 3] = [
        Engine::PrimaryVision,
        Engine::LabelDetector,
        Engine::StaticFallback,
    ];
}

/// Severity of an observed infection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Mild,
    #[default]
    Moderate,
    Severe,
}

impl Severity {
    /// Parses a severity label loosely, as vision models rarely stick to the
    /// exact vocabulary. Anything unrecognised is treated as moderate.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "none" | "healthy" | "no" => Severity::None,
            "mild" | "low" | "minor" => Severity::Mild,
            "severe" | "high" | "critical" => Severity::Severe,
            _ => Severity::Moderate,
        }
    }
}

/// Languages the service can reply in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Ta,
    Te,
    Kn,
    Bn,
    Mr,
    Pa,
    Gu,
}

impl Language {
    /// Language of the knowledge base and the untranslated pipeline output.
    pub const BASE: Language = Language::En;

    /// All supported languages in menu order.
    pub const ALL: [Language; 9] = [
        Language::En,
        Language::Hi,
        Language::Ta,
        Language::Te,
        Language::Kn,
        Language::Bn,
        Language::Mr,
        Language::Pa,
        Language::Gu,
    ];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Ta => "ta",
            Language::Te => "te",
            Language::Kn => "kn",
            Language::Bn => "bn",
            Language::Mr => "mr",
            Language::Pa => "pa",
            Language::Gu => "gu",
        }
    }

    pub fn english_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "Hindi",
            Language::Ta => "Tamil",
            Language::Te => "Telugu",
            Language::Kn => "Kannada",
            Language::Bn => "Bengali",
            Language::Mr => "Marathi",
            Language::Pa => "Punjabi",
            Language::Gu => "Gujarati",
        }
    }

    /// Name of the language written in its own script.
    pub fn native_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "हिंदी",
            Language::Ta => "தமிழ்",
            Language::Te => "తెలుగు",
            Language::Kn => "ಕನ್ನಡ",
            Language::Bn => "বাংলা",
            Language::Mr => "मराठी",
            Language::Pa => "ਪੰਜਾਬੀ",
            Language::Gu => "ગુજરાતી",
        }
    }

    /// Parses a language code, falling back to the base language.
    pub fn from_code_or_base(code: &str) -> Language {
        code.trim().parse().unwrap_or(Language::BASE)
    }
}

/// An image submitted for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    /// Declared media type, e.g. `image/jpeg`.
    pub media_type: String,
    /// Channel identifier of whoever sent the image (`web`, `whatsapp:+91...`).
    pub source: String,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            source: source.into(),
        }
    }
}

/// A raw diagnosis produced by exactly one backend call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisCandidate {
    pub crop: String,
    pub disease_key: String,
    pub disease_name: String,
    /// Cause category as reported by the backend (fungal, bacterial, ...).
    pub cause: String,
    /// Confidence in percent, 0..=100.
    pub confidence: u8,
    pub severity: Severity,
    pub is_healthy: bool,
    pub symptoms_observed: Vec<String>,
    pub affected_area_percent: u8,
    pub spread_risk: String,
    pub immediate_action_needed: bool,
    pub notes: String,
    pub engine: Engine,
    /// Engine-specific details (model id, auth strategy, raw labels).
    #[serde(default)]
    pub engine_meta: serde_json::Map<String, serde_json::Value>,
}

/// A chemical treatment listed in a disease record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treatment {
    pub name: String,
    pub dosage: String,
    /// Application method, e.g. "Foliar spray".
    pub method: String,
    pub frequency: String,
    /// Approximate cost in rupees per acre.
    pub cost_per_acre: u32,
}

/// Pre-authored text for one language.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub crop: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A knowledge-base record for one disease (or the healthy state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    /// Lookup key; filled in from the map key when loading.
    #[serde(default)]
    pub key: String,
    pub disease_name: String,
    pub scientific_name: String,
    pub crop: String,
    pub category: String,
    pub severity_typical: Severity,
    pub description: String,
    pub symptoms: Vec<String>,
    pub treatments: Vec<Treatment>,
    pub organic_treatments: Vec<String>,
    pub prevention: Vec<String>,
    pub favorable_conditions: String,
    #[serde(default)]
    pub localized: BTreeMap<Language, LocalizedText>,
}

impl DiseaseRecord {
    /// Pre-authored text for `language`, if any.
    pub fn localized(&self, language: Language) -> Option<&LocalizedText> {
        self.localized.get(&language)
    }

    /// Disease name in `language`, or the English name.
    pub fn local_name(&self, language: Language) -> &str {
        self.localized(language)
            .and_then(|l| l.name.as_deref())
            .unwrap_or(&self.disease_name)
    }

    /// Description in `language` if one was pre-authored.
    pub fn local_description(&self, language: Language) -> Option<&str> {
        self.localized(language)
            .and_then(|l| l.description.as_deref())
    }

    pub fn is_healthy(&self) -> bool {
        self.key == HEALTHY_KEY
    }
}

/// A crop the knowledge base knows about, with its diseases in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropInfo {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub local_names: BTreeMap<Language, String>,
    pub diseases: Vec<String>,
}

/// Reference to a media object held by a chat provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Provider media id or direct download URL.
    pub reference: String,
    pub media_type: Option<String>,
}

/// Payload of an inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Text(String),
    Image(MediaRef),
}

/// A provider-agnostic inbound chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub sender_id: String,
    pub kind: EventKind,
    /// Provider fields kept for logging; never inspected by the conversation flow.
    pub raw: serde_json::Value,
}

impl InboundEvent {
    pub fn text(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            kind: EventKind::Text(text.into()),
            raw: serde_json::Value::Null,
        }
    }

    pub fn image(sender_id: impl Into<String>, media: MediaRef) -> Self {
        Self {
            sender_id: sender_id.into(),
            kind: EventKind::Image(media),
            raw: serde_json::Value::Null,
        }
    }
}

/// A provider-agnostic reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub recipient: String,
    pub text: String,
}

/// Everything persisted for one scan.
#[derive(Debug, Clone)]
pub struct ScanRecord {
    pub scan_id: String,
    pub sender: String,
    pub captured_at: DateTime<Utc>,
    pub image: ImagePayload,
    pub result: serde_json::Value,
}
