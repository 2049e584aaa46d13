// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the FasalDrishti service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FasalConfig {
    /// HTTP listener and logging.
    #[serde(default)]
    pub server: ServerConfig,

    /// Primary vision model backend.
    #[serde(default)]
    pub vision: VisionConfig,

    /// Label detection backend.
    #[serde(default)]
    pub labels: LabelsConfig,

    /// Machine translation.
    #[serde(default)]
    pub translate: TranslateConfig,

    /// Circuit breaker thresholds shared by all gated backends.
    #[serde(default)]
    pub breaker: BreakerSettings,

    /// Image preprocessing and stage time limits.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Scan archive.
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// WhatsApp providers.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Vision model (Anthropic Messages API) configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VisionConfig {
    /// API key sent as `x-api-key`. `None` skips key auth.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Bearer token tried when key auth fails or is not configured.
    #[serde(default)]
    pub bearer_token: Option<String>,

    #[serde(default = "default_vision_base_url")]
    pub base_url: String,

    /// Endpoint used with bearer auth. Defaults to `base_url`.
    #[serde(default)]
    pub bearer_base_url: Option<String>,

    #[serde(default = "default_vision_model")]
    pub model: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_vision_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            bearer_token: None,
            base_url: default_vision_base_url(),
            bearer_base_url: None,
            model: default_vision_model(),
            api_version: default_api_version(),
            max_tokens: default_vision_max_tokens(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionConfig")
            .field("api_key", &redact(&self.api_key))
            .field("bearer_token", &redact(&self.bearer_token))
            .field("base_url", &self.base_url)
            .field("bearer_base_url", &self.bearer_base_url)
            .field("model", &self.model)
            .field("api_version", &self.api_version)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

fn default_vision_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_vision_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_vision_max_tokens() -> u32 {
    1500
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Label detection (Google Cloud Vision) configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LabelsConfig {
    /// API key. `None` disables the label detector.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_labels_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_max_labels")]
    pub max_labels: u32,

    /// Labels scoring below this (0.0..=1.0) are ignored.
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_labels_endpoint(),
            max_labels: default_max_labels(),
            min_score: default_min_score(),
        }
    }
}

impl fmt::Debug for LabelsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelsConfig")
            .field("api_key", &redact(&self.api_key))
            .field("endpoint", &self.endpoint)
            .field("max_labels", &self.max_labels)
            .field("min_score", &self.min_score)
            .finish()
    }
}

fn default_labels_endpoint() -> String {
    "https://vision.googleapis.com/v1/images:annotate".to_string()
}

fn default_max_labels() -> u32 {
    25
}

fn default_min_score() -> f32 {
    0.5
}

/// Translation (Google Translate v2) configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TranslateConfig {
    /// API key. `None` disables machine translation; pre-authored text is still used.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_translate_endpoint")]
    pub endpoint: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_translate_endpoint(),
        }
    }
}

impl fmt::Debug for TranslateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslateConfig")
            .field("api_key", &redact(&self.api_key))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

fn default_translate_endpoint() -> String {
    "https://translation.googleapis.com/language/translate/v2".to_string()
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerSettings {
    /// Consecutive failures before a backend is skipped.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds after the last failure before a trial call is allowed.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    2
}

fn default_cooldown_secs() -> u64 {
    300
}

/// Pipeline stage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Longest image side after preprocessing, in pixels.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// JPEG quality used when re-encoding (1..=100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Wall-clock limit for one backend call.
    #[serde(default = "default_backend_timeout_secs")]
    pub backend_timeout_secs: u64,

    /// Wall-clock limit for preprocessing, each translation call and archival.
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
            backend_timeout_secs: default_backend_timeout_secs(),
            stage_timeout_secs: default_stage_timeout_secs(),
        }
    }
}

fn default_max_dimension() -> u32 {
    1024
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_backend_timeout_secs() -> u64 {
    12
}

fn default_stage_timeout_secs() -> u64 {
    8
}

/// Scan archive configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    #[serde(default = "default_archive_enabled")]
    pub enabled: bool,

    /// Directory under which `scans/` is created.
    #[serde(default = "default_archive_root")]
    pub root: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: default_archive_enabled(),
            root: default_archive_root(),
        }
    }
}

fn default_archive_enabled() -> bool {
    true
}

fn default_archive_root() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("fasal").display().to_string())
        .unwrap_or_else(|| "./fasal-data".to_string())
}

/// WhatsApp provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Token echoed back by the webhook verification handshake.
    #[serde(default = "default_verify_token")]
    pub verify_token: String,

    /// Publicly reachable base URL, used to check Twilio request signatures.
    #[serde(default)]
    pub public_url: Option<String>,

    #[serde(default)]
    pub meta: MetaConfig,

    #[serde(default)]
    pub twilio: TwilioConfig,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            verify_token: default_verify_token(),
            public_url: None,
            meta: MetaConfig::default(),
            twilio: TwilioConfig::default(),
        }
    }
}

fn default_verify_token() -> String {
    "fasaldrishti_verify_2026".to_string()
}

/// Meta WhatsApp Cloud API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetaConfig {
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// App secret for `X-Hub-Signature-256` checks. `None` skips the check.
    #[serde(default)]
    pub app_secret: Option<String>,

    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            app_secret: None,
            graph_base_url: default_graph_base_url(),
        }
    }
}

impl fmt::Debug for MetaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaConfig")
            .field("access_token", &redact(&self.access_token))
            .field("phone_number_id", &self.phone_number_id)
            .field("app_secret", &redact(&self.app_secret))
            .field("graph_base_url", &self.graph_base_url)
            .finish()
    }
}

fn default_graph_base_url() -> String {
    "https://graph.facebook.com/v18.0".to_string()
}

/// Twilio WhatsApp configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: Option<String>,

    /// Used for media download auth and, when set, request signature checks.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Sender number, e.g. `whatsapp:+14155238886`.
    #[serde(default)]
    pub whatsapp_number: Option<String>,
}

impl fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &redact(&self.auth_token))
            .field("whatsapp_number", &self.whatsapp_number)
            .finish()
    }
}

fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "[redacted]")
}
