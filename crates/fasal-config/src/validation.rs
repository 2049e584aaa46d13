// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-zero ports, sane image limits and breaker thresholds.

use crate::diagnostic::ConfigError;
use crate::model::FasalConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &FasalConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.server.port == 0 {
        fail("server.port must not be 0".to_string());
    }

    if config.server.host.trim().is_empty() {
        fail("server.host must not be empty".to_string());
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        fail(format!(
            "server.log_level `{}` is not one of {}",
            config.server.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.breaker.failure_threshold == 0 {
        fail("breaker.failure_threshold must be at least 1".to_string());
    }

    if config.pipeline.max_dimension < 64 {
        fail(format!(
            "pipeline.max_dimension must be at least 64, got {}",
            config.pipeline.max_dimension
        ));
    }

    if !(1..=100).contains(&config.pipeline.jpeg_quality) {
        fail(format!(
            "pipeline.jpeg_quality must be within 1..=100, got {}",
            config.pipeline.jpeg_quality
        ));
    }

    if config.pipeline.backend_timeout_secs == 0 || config.pipeline.stage_timeout_secs == 0 {
        fail("pipeline timeouts must be at least 1 second".to_string());
    }

    if !(0.0..=1.0).contains(&config.labels.min_score) {
        fail(format!(
            "labels.min_score must be within 0.0..=1.0, got {}",
            config.labels.min_score
        ));
    }

    if config.whatsapp.verify_token.trim().is_empty() {
        fail("whatsapp.verify_token must not be empty".to_string());
    }

    if config.whatsapp.meta.access_token.is_some() && config.whatsapp.meta.phone_number_id.is_none()
    {
        fail("whatsapp.meta.phone_number_id is required when access_token is set".to_string());
    }

    if config.archive.enabled && config.archive.root.trim().is_empty() {
        fail("archive.root must not be empty when the archive is enabled".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = FasalConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_threshold_fails_validation() {
        let mut config = FasalConfig::default();
        config.breaker.failure_threshold = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("failure_threshold"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = FasalConfig::default();
        config.server.port = 0;
        config.pipeline.jpeg_quality = 0;
        config.server.log_level = "loud".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn meta_token_requires_phone_number_id() {
        let mut config = FasalConfig::default();
        config.whatsapp.meta.access_token = Some("token".into());
        assert!(validate_config(&config).is_err());
        config.whatsapp.meta.phone_number_id = Some("1234".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn out_of_range_min_score_from_toml() {
        let toml_str = r#"
[labels]
api_key = "k"
min_score = 1.5
"#;
        let config: FasalConfig = toml::from_str(toml_str).unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("labels.min_score"));
    }

    #[test]
    fn enabled_archive_needs_a_root() {
        let toml_str = r#"
[archive]
enabled = true
root = "  "
"#;
        let config: FasalConfig = toml::from_str(toml_str).unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn unknown_breaker_field_is_rejected() {
        let toml_str = r#"
[breaker]
failure_treshold = 3
"#;
        assert!(toml::from_str::<FasalConfig>(toml_str).is_err());
    }
}
