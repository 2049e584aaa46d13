// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation stage and the Cloud Translation v2 client.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fasal_config::model::TranslateConfig;
use fasal_core::{FasalError, Language, Translator};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::enrich::EnrichedResult;

/// Longest text sent in one translation call, in characters.
pub const MAX_TRANSLATION_CHARS: usize = 5000;

/// Google Cloud Translation (v2 REST) client.
pub struct GoogleTranslator {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

impl GoogleTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self, FasalError> {
        let key = config
            .api_key
            .as_deref()
            .ok_or_else(|| FasalError::Config("translator needs translate.api_key".into()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| FasalError::Translation {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            url: format!("{}?key={key}", config.endpoint),
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, FasalError> {
        let body = json!({
            "q": text,
            "source": source.code(),
            "target": target.code(),
            "format": "text",
        });
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FasalError::Translation {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FasalError::Translation {
                message: format!("translation API returned {status}: {text}"),
                source: None,
            });
        }

        let parsed: TranslateResponse =
            response.json().await.map_err(|e| FasalError::Translation {
                message: format!("failed to parse translation response: {e}"),
                source: Some(Box::new(e)),
            })?;
        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| FasalError::Translation {
                message: "translation response was empty".into(),
                source: None,
            })
    }
}

/// Display text for one language.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Localized {
    pub language: Language,
    /// Description in the target language (or the English original).
    pub description: String,
    /// Treatment application methods keyed by their English text.
    pub methods: BTreeMap<String, String>,
}

impl Localized {
    /// Method text in the target language, or `original` when none is known.
    pub fn method<'a>(&'a self, original: &'a str) -> &'a str {
        self.methods.get(original).map_or(original, String::as_str)
    }
}

/// Produces the language-specific text of a result.
#[derive(Clone)]
pub struct TranslationStage {
    translator: Option<Arc<dyn Translator>>,
    timeout: Duration,
}

impl TranslationStage {
    pub fn new(translator: Option<Arc<dyn Translator>>, timeout: Duration) -> Self {
        Self {
            translator,
            timeout,
        }
    }

    pub fn has_translator(&self) -> bool {
        self.translator.is_some()
    }

    /// Localises the description and treatment methods of `result`.
    ///
    /// Pre-authored descriptions win over machine translation. Every method
    /// text is translated at most once. The calls run concurrently and share
    /// one deadline; anything failed or unfinished keeps the English text.
    pub async fn localize(&self, result: &EnrichedResult, language: Language) -> Localized {
        let record = &result.record;
        let mut localized = Localized {
            language,
            description: record.description.clone(),
            methods: BTreeMap::new(),
        };
        if language == Language::BASE {
            return localized;
        }

        let mut wanted: Vec<&str> = Vec::new();
        let authored = record.local_description(language);
        if authored.is_none() {
            wanted.push(&record.description);
        }
        for treatment in &record.treatments {
            if !treatment.method.is_empty() && !wanted.contains(&treatment.method.as_str()) {
                wanted.push(&treatment.method);
            }
        }

        let mut translated = self.translate_all(&wanted, language).await;
        localized.description = match authored {
            Some(text) => text.to_string(),
            None => translated
                .get(&record.description)
                .cloned()
                .unwrap_or_else(|| record.description.clone()),
        };
        for treatment in &record.treatments {
            if treatment.method.is_empty() || localized.methods.contains_key(&treatment.method) {
                continue;
            }
            let text = translated
                .remove(&treatment.method)
                .unwrap_or_else(|| treatment.method.clone());
            localized.methods.insert(treatment.method.clone(), text);
        }
        localized
    }

    /// Translates every text in `texts`, keyed by the original.
    async fn translate_all(&self, texts: &[&str], target: Language) -> HashMap<String, String> {
        let mut out = HashMap::new();
        let Some(translator) = &self.translator else {
            return out;
        };

        let mut calls = JoinSet::new();
        for text in texts.iter().filter(|t| !t.trim().is_empty()) {
            let translator = Arc::clone(translator);
            let original = text.to_string();
            let capped = cap_chars(text, MAX_TRANSLATION_CHARS).to_string();
            calls.spawn(async move {
                let result = translator.translate(&capped, Language::BASE, target).await;
                (original, result)
            });
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            match tokio::time::timeout_at(deadline, calls.join_next()).await {
                Ok(None) => break,
                Ok(Some(Ok((original, Ok(translated))))) => {
                    debug!(%target, chars = original.len(), "text translated");
                    out.insert(original, translated);
                }
                Ok(Some(Ok((_, Err(e))))) => {
                    warn!(%target, error = %e, "translation failed, keeping original");
                }
                Ok(Some(Err(e))) => {
                    warn!(%target, error = %e, "translation task failed, keeping original");
                }
                Err(_) => {
                    warn!(
                        %target,
                        unfinished = calls.len(),
                        timeout_secs = self.timeout.as_secs(),
                        "translation timed out"
                    );
                    calls.abort_all();
                    break;
                }
            }
        }
        out
    }
}

/// Longest prefix of `text` with at most `max` characters.
fn cap_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
