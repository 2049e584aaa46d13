// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock translator that tags text instead of translating it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use fasal_core::{FasalError, Language, Translator};

/// Returns `"[{target}] {text}"`, or fails when built with [`MockTranslator::failing`].
#[derive(Default)]
pub struct MockTranslator {
    fail: AtomicBool,
    delay: Option<Duration>,
    requests: Mutex<Vec<(String, Language)>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            ..Self::default()
        }
    }

    /// Answers each request only after `delay`.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Every `(text, target)` pair requested so far.
    pub async fn requests(&self) -> Vec<(String, Language)> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source: Language,
        target: Language,
    ) -> Result<String, FasalError> {
        self.requests.lock().await.push((text.to_string(), target));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(FasalError::Translation {
                message: "scripted failure".into(),
                source: None,
            });
        }
        Ok(format!("[{target}] {text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tags_text_with_target_language() {
        let translator = MockTranslator::new();
        let out = translator
            .translate("Spray weekly", Language::En, Language::Ta)
            .await
            .unwrap();
        assert_eq!(out, "[ta] Spray weekly");
        assert_eq!(translator.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn failing_translator_errors() {
        let translator = MockTranslator::failing();
        assert!(
            translator
                .translate("x", Language::En, Language::Hi)
                .await
                .is_err()
        );
    }
}
