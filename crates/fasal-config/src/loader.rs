// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./fasal.toml` > `~/.config/fasal/fasal.toml` > `/etc/fasal/fasal.toml`
//! with environment variable overrides via `FASAL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FasalConfig;

pub(crate) const LOCAL_CONFIG: &str = "fasal.toml";
pub(crate) const SYSTEM_CONFIG: &str = "/etc/fasal/fasal.toml";

/// Env var sections, most specific first. `FASAL_WHATSAPP_META_ACCESS_TOKEN`
/// must land in `whatsapp.meta.access_token`, not `whatsapp.meta_access_token`.
const ENV_SECTIONS: &[(&str, &str)] = &[
    ("whatsapp_meta_", "whatsapp.meta."),
    ("whatsapp_twilio_", "whatsapp.twilio."),
    ("whatsapp_", "whatsapp."),
    ("server_", "server."),
    ("vision_", "vision."),
    ("labels_", "labels."),
    ("translate_", "translate."),
    ("breaker_", "breaker."),
    ("pipeline_", "pipeline."),
    ("archive_", "archive."),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/fasal/fasal.toml` (system-wide)
/// 3. `~/.config/fasal/fasal.toml` (user XDG config)
/// 4. `./fasal.toml` (local directory)
/// 5. `FASAL_*` environment variables
pub fn load_config() -> Result<FasalConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FasalConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FasalConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FasalConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FasalConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FasalConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fasal").join(LOCAL_CONFIG))
}

/// Environment provider with an explicit section map instead of `Env::split("_")`,
/// since key names themselves contain underscores.
fn env_provider() -> Env {
    Env::prefixed("FASAL_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    ENV_SECTIONS
        .iter()
        .find_map(|(prefix, section)| {
            key.strip_prefix(prefix)
                .map(|rest| format!("{section}{rest}"))
        })
        .unwrap_or_else(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_nested_sections() {
        assert_eq!(map_env_key("vision_api_key"), "vision.api_key");
        assert_eq!(
            map_env_key("whatsapp_meta_access_token"),
            "whatsapp.meta.access_token"
        );
        assert_eq!(
            map_env_key("whatsapp_twilio_auth_token"),
            "whatsapp.twilio.auth_token"
        );
        assert_eq!(map_env_key("whatsapp_verify_token"), "whatsapp.verify_token");
        assert_eq!(map_env_key("breaker_cooldown_secs"), "breaker.cooldown_secs");
    }

    #[test]
    fn unknown_env_sections_pass_through() {
        assert_eq!(map_env_key("something_else"), "something_else");
    }
}
