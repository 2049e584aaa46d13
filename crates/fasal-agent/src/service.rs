// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Applies conversation decisions: session updates, media download and
//! pipeline runs.

use std::sync::Arc;

use fasal_core::{InboundEvent, Language, MediaFetcher, MediaRef, OutboundMessage};
use fasal_pipeline::{AnalysisPipeline, AnalysisRequest};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::{Action, decide};
use crate::format::format_diagnosis;
use crate::i18n::catalog;
use crate::session::{ConversationState, SenderLocks, SessionStore, UserSession};

/// Result of one conversation turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub reply: OutboundMessage,
    /// State of the sender after the turn.
    pub state: ConversationState,
    /// Scan id when the turn ran an analysis.
    pub scan_id: Option<String>,
}

/// Runs conversation turns for every sender of a chat channel.
pub struct ConversationService {
    pipeline: Arc<AnalysisPipeline>,
    sessions: Arc<dyn SessionStore>,
    locks: SenderLocks,
}

impl ConversationService {
    pub fn new(pipeline: Arc<AnalysisPipeline>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            pipeline,
            sessions,
            locks: SenderLocks::new(),
        }
    }

    pub fn pipeline(&self) -> &Arc<AnalysisPipeline> {
        &self.pipeline
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.count().await
    }

    pub async fn state_of(&self, sender: &str) -> ConversationState {
        ConversationState::of(self.sessions.get(sender).await.as_ref())
    }

    /// Marks `sender` as having chosen `language`.
    pub async fn set_language(&self, sender: &str, language: Language) {
        let _guard = self.locks.acquire(sender).await;
        self.sessions
            .put(sender, UserSession::active(language))
            .await;
    }

    /// Handles one inbound event.
    ///
    /// The session is read and written under the sender's lock; media
    /// download and analysis run after the lock is released. The analysis
    /// runs on its own task and completes even if this future is dropped.
    /// Without a `fetcher` images cannot be retrieved and the sender is
    /// told so.
    pub async fn handle(
        &self,
        event: &InboundEvent,
        fetcher: Option<&dyn MediaFetcher>,
    ) -> TurnOutcome {
        let sender = event.sender_id.as_str();

        let (action, state) = {
            let _guard = self.locks.acquire(sender).await;
            let current = self.sessions.get(sender).await;
            let decision = decide(current.as_ref(), &event.kind);
            let state = match decision.next {
                Some(next) => {
                    self.sessions.put(sender, next).await;
                    next.state()
                }
                None => ConversationState::of(current.as_ref()),
            };
            (decision.action, state)
        };
        debug!(sender, %state, "conversation turn decided");

        let (text, scan_id) = match action {
            Action::Reply(text) => (text, None),
            Action::Analyze { media, language } => {
                match self.analyze(sender, &media, language, fetcher).await {
                    Ok((text, scan_id)) => (text, Some(scan_id)),
                    Err(text) => (text, None),
                }
            }
        };

        TurnOutcome {
            reply: OutboundMessage {
                recipient: sender.to_string(),
                text,
            },
            state,
            scan_id,
        }
    }

    /// Returns the formatted report and scan id, or the localized error reply.
    async fn analyze(
        &self,
        sender: &str,
        media: &MediaRef,
        language: Language,
        fetcher: Option<&dyn MediaFetcher>,
    ) -> Result<(String, String), String> {
        let strings = catalog(language);
        let Some(fetcher) = fetcher else {
            warn!(sender, "image received on a channel without media download");
            return Err(strings.image_error.to_string());
        };

        let image = fetcher.fetch(media, sender).await.map_err(|e| {
            warn!(sender, error = %e, "media download failed");
            strings.image_error.to_string()
        })?;

        let report = Arc::clone(&self.pipeline)
            .spawn_analysis(AnalysisRequest::new(image, language))
            .await
            .map_err(|e| {
                warn!(sender, error = %e, "chat analysis did not complete");
                strings.system_error.to_string()
            })?;
        info!(
            sender,
            scan_id = %report.scan_id,
            disease = %report.result.record.key,
            engine = %report.metadata.engine,
            "chat analysis complete"
        );
        Ok((format_diagnosis(&report), report.scan_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use fasal_core::{Engine, KnowledgeBase};
    use fasal_knowledge::StaticKnowledgeBase;
    use fasal_test_utils::{MockBackend, MockFetcher, MockTranslator, sample_candidate};

    use crate::i18n::{confirmation, language_menu};
    use crate::session::InMemorySessionStore;

    const FARMER: &str = "whatsapp:+919800000001";

    fn service(backend: Arc<MockBackend>) -> ConversationService {
        let kb: Arc<dyn KnowledgeBase> = Arc::new(StaticKnowledgeBase::builtin().unwrap());
        let pipeline = AnalysisPipeline::builder(kb)
            .backend(backend)
            .translator(Arc::new(MockTranslator::new()))
            .seed(7)
            .build();
        ConversationService::new(Arc::new(pipeline), Arc::new(InMemorySessionStore::new()))
    }

    fn vision() -> Arc<MockBackend> {
        Arc::new(MockBackend::succeeding(
            Engine::PrimaryVision,
            sample_candidate(Engine::PrimaryVision, "tomato", "tomato_early_blight"),
        ))
    }

    fn photo() -> InboundEvent {
        InboundEvent::image(
            FARMER,
            MediaRef {
                reference: "media-1".into(),
                media_type: Some("image/jpeg".into()),
            },
        )
    }

    #[tokio::test]
    async fn hindi_farmer_gets_a_hindi_diagnosis() {
        let backend = vision();
        let service = service(backend.clone());
        let fetcher = MockFetcher::returning(vec![0xFF, 0xD8, 0xFF]);

        let first = service.handle(&InboundEvent::text(FARMER, "hello"), None).await;
        assert_eq!(first.reply.text, language_menu());
        assert_eq!(first.state, ConversationState::AwaitingLanguage);

        let second = service.handle(&InboundEvent::text(FARMER, "2"), None).await;
        assert_eq!(second.reply.text, confirmation(Language::Hi));
        assert_eq!(second.state, ConversationState::Active(Language::Hi));

        let third = service.handle(&photo(), Some(&fetcher)).await;
        assert_eq!(third.reply.recipient, FARMER);
        assert!(third.reply.text.contains("अगेती झुलसा"));
        assert!(third.reply.text.contains("[hi] Foliar spray"));
        assert_eq!(third.scan_id.as_deref().map(str::len), Some(8));
        assert_eq!(backend.calls(), 1);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(service.session_count().await, 1);
    }

    #[tokio::test]
    async fn photo_from_new_sender_is_not_analyzed() {
        let backend = vision();
        let service = service(backend.clone());
        let fetcher = MockFetcher::returning(vec![1]);

        let outcome = service.handle(&photo(), Some(&fetcher)).await;
        assert_eq!(outcome.reply.text, language_menu());
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn reselecting_the_same_language_changes_nothing() {
        let service = service(vision());
        service.set_language(FARMER, Language::Ta).await;

        let outcome = service.handle(&InboundEvent::text(FARMER, "3"), None).await;
        assert_eq!(outcome.reply.text, confirmation(Language::Ta));
        assert_eq!(service.state_of(FARMER).await, ConversationState::Active(Language::Ta));
        assert_eq!(service.session_count().await, 1);
    }

    #[tokio::test]
    async fn lang_command_reopens_the_menu() {
        let service = service(vision());
        service.set_language(FARMER, Language::Hi).await;

        let outcome = service.handle(&InboundEvent::text(FARMER, "LANG"), None).await;
        assert_eq!(outcome.reply.text, language_menu());
        assert_eq!(outcome.state, ConversationState::AwaitingLanguage);

        let after = service.handle(&InboundEvent::text(FARMER, "1"), None).await;
        assert_eq!(after.state, ConversationState::Active(Language::En));
    }

    #[tokio::test]
    async fn failed_download_reports_image_error_without_analysis() {
        let backend = vision();
        let service = service(backend.clone());
        service.set_language(FARMER, Language::Hi).await;

        let failing = MockFetcher::failing();
        let outcome = service.handle(&photo(), Some(&failing)).await;
        assert_eq!(outcome.reply.text, catalog(Language::Hi).image_error);
        assert_eq!(outcome.scan_id, None);
        assert_eq!(backend.calls(), 0);

        let no_fetcher = service.handle(&photo(), None).await;
        assert_eq!(no_fetcher.reply.text, catalog(Language::Hi).image_error);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn analysis_finishes_after_the_turn_is_dropped() {
        let backend = Arc::new(MockBackend::slow(
            Engine::PrimaryVision,
            Duration::from_millis(300),
            sample_candidate(Engine::PrimaryVision, "tomato", "tomato_early_blight"),
        ));
        let service = Arc::new(service(backend.clone()));
        service.set_language(FARMER, Language::En).await;

        let turn = {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let fetcher = MockFetcher::returning(vec![0xFF, 0xD8, 0xFF]);
                service.handle(&photo(), Some(&fetcher)).await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        turn.abort();
        assert!(turn.await.unwrap_err().is_cancelled());

        for _ in 0..100 {
            if backend.finished() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(backend.calls(), 1);
        assert_eq!(backend.finished(), 1);
    }

    #[tokio::test]
    async fn crashed_analysis_gets_the_system_error_reply() {
        let service = service(Arc::new(MockBackend::panicking(Engine::PrimaryVision)));
        service.set_language(FARMER, Language::Ta).await;

        let fetcher = MockFetcher::returning(vec![0xFF, 0xD8, 0xFF]);
        let outcome = service.handle(&photo(), Some(&fetcher)).await;
        assert_eq!(outcome.reply.text, catalog(Language::Ta).system_error);
        assert_ne!(catalog(Language::Ta).system_error, catalog(Language::Ta).image_error);
        assert!(outcome.scan_id.is_none());
        assert_eq!(outcome.state, ConversationState::Active(Language::Ta));
    }

    #[tokio::test]
    async fn concurrent_first_messages_create_one_session() {
        let service = Arc::new(service(vision()));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.handle(&InboundEvent::text(FARMER, "hi"), None).await
            }));
        }
        for handle in handles {
            let outcome = handle.await.unwrap();
            assert_eq!(outcome.reply.text, language_menu());
        }
        assert_eq!(service.session_count().await, 1);
        assert_eq!(service.state_of(FARMER).await, ConversationState::AwaitingLanguage);
    }
}
