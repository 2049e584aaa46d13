// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Crop diagnosis pipeline.
//!
//! preprocess -> diagnose (fallback chain) -> enrich -> translate -> archive.
//! Every stage degrades instead of failing, so [`AnalysisPipeline::analyze`]
//! always returns a report.

pub mod archive;
pub mod chain;
pub mod enrich;
pub mod fallback;
pub mod labels;
pub mod preprocess;
pub mod report;
pub mod translate;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fasal_config::FasalConfig;
use fasal_config::model::PipelineConfig;
use fasal_core::{
    DiagnosisBackend, Engine, FasalError, ImagePayload, KnowledgeBase, Language, ScanArchive,
    ScanRecord, Translator,
};
use fasal_resilience::{BreakerConfig, BreakerSnapshot};
use fasal_vision::VisionBackend;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

pub use archive::FsArchive;
pub use chain::{Attempt, AttemptOutcome, FallbackChain};
pub use enrich::{EnrichedResult, enrich};
pub use fallback::StaticFallback;
pub use labels::LabelDetector;
pub use preprocess::Preprocessor;
pub use report::{AnalysisReport, AnalyzeResponse, PipelineMetadata};
pub use translate::{GoogleTranslator, Localized, TranslationStage};

/// Stage names in execution order.
pub const STAGES: [&str; 5] = ["preprocess", "diagnose", "enrich", "translate", "archive"];

/// One image to analyze.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: ImagePayload,
    pub language: Language,
    /// What the farmer says they grow, if anything.
    pub crop_hint: Option<String>,
}

impl AnalysisRequest {
    pub fn new(image: ImagePayload, language: Language) -> Self {
        Self {
            image,
            language,
            crop_hint: None,
        }
    }

    pub fn with_crop_hint(mut self, hint: Option<String>) -> Self {
        self.crop_hint = hint.filter(|h| !h.trim().is_empty());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub engine: Engine,
    /// `None` for the ungated terminal fallback.
    pub breaker: Option<BreakerSnapshot>,
}

/// Readiness view for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    pub stages: Vec<&'static str>,
    pub engines: Vec<EngineStatus>,
    pub translator: bool,
    pub archive: bool,
    pub diseases: usize,
    pub crops: usize,
}

pub struct AnalysisPipeline {
    kb: Arc<dyn KnowledgeBase>,
    preprocessor: Preprocessor,
    chain: FallbackChain,
    translation: TranslationStage,
    archive: Option<Arc<dyn ScanArchive>>,
    archive_timeout: Duration,
}

impl AnalysisPipeline {
    pub fn builder(kb: Arc<dyn KnowledgeBase>) -> PipelineBuilder {
        PipelineBuilder::new(kb)
    }

    /// Wires the pipeline from configuration. Backends without credentials
    /// are left out of the chain.
    pub fn from_config(
        config: &FasalConfig,
        kb: Arc<dyn KnowledgeBase>,
    ) -> Result<Self, FasalError> {
        let mut builder = Self::builder(Arc::clone(&kb))
            .settings(config.pipeline.clone())
            .breaker(BreakerConfig {
                failure_threshold: config.breaker.failure_threshold,
                cooldown: Duration::from_secs(config.breaker.cooldown_secs),
            });

        if config.vision.api_key.is_some() || config.vision.bearer_token.is_some() {
            builder = builder.backend(Arc::new(VisionBackend::new(&config.vision, kb.as_ref())?));
        } else {
            warn!("no vision credentials configured, primary vision backend disabled");
        }
        if config.labels.api_key.is_some() {
            builder = builder.backend(Arc::new(LabelDetector::new(
                &config.labels,
                Arc::clone(&kb),
            )?));
        } else {
            warn!("no labels.api_key configured, label detector disabled");
        }
        if config.translate.api_key.is_some() {
            builder = builder.translator(Arc::new(GoogleTranslator::new(&config.translate)?));
        }
        if config.archive.enabled {
            builder = builder.archive(Arc::new(FsArchive::new(&config.archive.root)));
        }
        Ok(builder.build())
    }

    pub fn knowledge(&self) -> &Arc<dyn KnowledgeBase> {
        &self.kb
    }

    pub fn status(&self) -> PipelineStatus {
        let registry = self.chain.registry();
        PipelineStatus {
            stages: STAGES.to_vec(),
            engines: self
                .chain
                .engines()
                .into_iter()
                .map(|engine| EngineStatus {
                    engine,
                    breaker: registry.get(engine).map(|b| b.snapshot()),
                })
                .collect(),
            translator: self.translation.has_translator(),
            archive: self.archive.is_some(),
            diseases: self.kb.records().len(),
            crops: self.kb.crops().len(),
        }
    }

    /// Runs every stage. Never fails; archival continues in the background.
    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisReport {
        let started = Instant::now();
        let scan_id = new_scan_id();
        let sender = request.image.source.clone();
        let hint = request.crop_hint.as_deref();

        let processed = self.preprocessor.run(request.image).await;
        let (candidate, attempts) = self.chain.diagnose(&processed.image, hint).await;
        let result = enrich(&candidate, self.kb.as_ref(), hint);
        let localized = self.translation.localize(&result, request.language).await;

        let report = AnalysisReport {
            scan_id,
            language: request.language,
            metadata: PipelineMetadata {
                engine: candidate.engine,
                latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                image_resized: processed.resized,
                attempts,
            },
            result,
            localized,
        };

        info!(
            scan_id = %report.scan_id,
            engine = %report.metadata.engine,
            crop = %report.result.diagnosis.crop,
            disease = %report.result.record.key,
            confidence = report.result.diagnosis.confidence,
            latency_ms = report.metadata.latency_ms,
            "analysis complete"
        );

        if let Some(archive) = &self.archive {
            self.spawn_archive(Arc::clone(archive), sender, processed.image, &report);
        }
        report
    }

    /// Runs [`analyze`](Self::analyze) on its own task and waits for it.
    ///
    /// Dropping the returned future does not cancel the run: backend calls
    /// finish and record their breaker outcomes even when the caller goes
    /// away.
    pub async fn spawn_analysis(
        self: Arc<Self>,
        request: AnalysisRequest,
    ) -> Result<AnalysisReport, FasalError> {
        tokio::spawn(async move { self.analyze(request).await })
            .await
            .map_err(|e| FasalError::Internal(format!("analysis task failed: {e}")))
    }

    fn spawn_archive(
        &self,
        archive: Arc<dyn ScanArchive>,
        sender: String,
        image: ImagePayload,
        report: &AnalysisReport,
    ) {
        let result = match serde_json::to_value(report.to_response()) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "could not serialize scan result, skipping archive");
                return;
            }
        };
        let scan = ScanRecord {
            scan_id: report.scan_id.clone(),
            sender,
            captured_at: Utc::now(),
            image,
            result,
        };
        let timeout = self.archive_timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, archive.store(&scan)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!(scan_id = %scan.scan_id, error = %e, "archival failed"),
                Err(_) => warn!(scan_id = %scan.scan_id, "archival timed out"),
            }
        });
    }
}

/// Eight lowercase hex characters.
fn new_scan_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Assembles an [`AnalysisPipeline`] from parts.
pub struct PipelineBuilder {
    kb: Arc<dyn KnowledgeBase>,
    backends: Vec<Arc<dyn DiagnosisBackend>>,
    translator: Option<Arc<dyn Translator>>,
    archive: Option<Arc<dyn ScanArchive>>,
    settings: PipelineConfig,
    breaker: BreakerConfig,
    seed: Option<u64>,
}

impl PipelineBuilder {
    fn new(kb: Arc<dyn KnowledgeBase>) -> Self {
        Self {
            kb,
            backends: Vec::new(),
            translator: None,
            archive: None,
            settings: PipelineConfig::default(),
            breaker: BreakerConfig::default(),
            seed: None,
        }
    }

    /// Appends a breaker-gated backend; order of calls is chain order.
    pub fn backend(mut self, backend: Arc<dyn DiagnosisBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn archive(mut self, archive: Arc<dyn ScanArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn settings(mut self, settings: PipelineConfig) -> Self {
        self.settings = settings;
        self
    }

    pub fn breaker(mut self, breaker: BreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    /// Seeds the static fallback for reproducible output.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> AnalysisPipeline {
        let stage_timeout = Duration::from_secs(self.settings.stage_timeout_secs);
        let terminal = match self.seed {
            Some(seed) => StaticFallback::seeded(Arc::clone(&self.kb), seed),
            None => StaticFallback::new(Arc::clone(&self.kb)),
        };
        AnalysisPipeline {
            preprocessor: Preprocessor::new(
                self.settings.max_dimension,
                self.settings.jpeg_quality,
                stage_timeout,
            ),
            chain: FallbackChain::new(
                self.backends,
                terminal,
                self.breaker,
                Duration::from_secs(self.settings.backend_timeout_secs),
            ),
            translation: TranslationStage::new(self.translator, stage_timeout),
            archive: self.archive,
            archive_timeout: stage_timeout,
            kb: self.kb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fasal_knowledge::StaticKnowledgeBase;
    use fasal_test_utils::{MockBackend, MockTranslator, sample_candidate};

    fn kb() -> Arc<dyn KnowledgeBase> {
        Arc::new(StaticKnowledgeBase::builtin().unwrap())
    }

    fn request(language: Language) -> AnalysisRequest {
        AnalysisRequest::new(
            ImagePayload::new(b"not really a jpeg".to_vec(), "image/jpeg", "whatsapp:+919800000000"),
            language,
        )
    }

    #[tokio::test]
    async fn report_carries_enriched_and_localized_result() {
        let vision = Arc::new(MockBackend::succeeding(
            Engine::PrimaryVision,
            sample_candidate(Engine::PrimaryVision, "rice", "rice_leaf_scald"),
        ));
        let pipeline = AnalysisPipeline::builder(kb())
            .backend(vision)
            .translator(Arc::new(MockTranslator::new()))
            .build();

        let report = pipeline.analyze(request(Language::Ta)).await;
        assert_eq!(report.scan_id.len(), 8);
        assert!(report.scan_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(report.metadata.engine, Engine::PrimaryVision);
        assert!(!report.metadata.image_resized);
        assert_eq!(report.result.record.key, "rice_blast");

        let response = report.to_response();
        assert_eq!(response.disease, "rice_blast");
        assert!((response.confidence - 0.88).abs() < f64::EPSILON);
        assert!(response.description.starts_with("[ta] "));
        assert_eq!(response.treatments[0].application, "[ta] Foliar spray");
        assert_eq!(response.treatments[0].cost, "₹280/acre");
        assert_eq!(response.symptoms, vec!["brown lesions".to_string()]);
    }

    #[tokio::test]
    async fn vision_outage_falls_back_to_labels_then_skips_vision() {
        let vision = Arc::new(MockBackend::failing(Engine::PrimaryVision));
        let labels = Arc::new(MockBackend::succeeding(
            Engine::LabelDetector,
            sample_candidate(Engine::LabelDetector, "potato", "potato_late_blight"),
        ));
        let pipeline = AnalysisPipeline::builder(kb())
            .backend(vision.clone())
            .backend(labels.clone())
            .build();

        for _ in 0..2 {
            let report = pipeline.analyze(request(Language::En)).await;
            assert_eq!(report.metadata.engine, Engine::LabelDetector);
        }
        let report = pipeline.analyze(request(Language::En)).await;
        assert_eq!(vision.calls(), 2);
        assert_eq!(labels.calls(), 3);
        assert_eq!(
            report.metadata.attempts[0].outcome,
            AttemptOutcome::SkippedByBreaker
        );

        let status = pipeline.status();
        assert_eq!(status.stages, STAGES.to_vec());
        let engines: Vec<Engine> = status.engines.iter().map(|e| e.engine).collect();
        assert_eq!(engines, Engine::CHAIN.to_vec());
        assert!(status.engines[2].breaker.is_none());
    }

    #[tokio::test]
    async fn no_backends_still_produces_a_report() {
        let pipeline = AnalysisPipeline::builder(kb()).seed(9).build();
        let report = pipeline.analyze(request(Language::Hi)).await;
        assert_eq!(report.metadata.engine, Engine::StaticFallback);
        assert_eq!(
            Some(report.localized.description.as_str()),
            report.result.record.local_description(Language::Hi)
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn archive_runs_after_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = AnalysisPipeline::builder(kb())
            .seed(1)
            .archive(Arc::new(FsArchive::new(dir.path())))
            .build();

        let report = pipeline.analyze(request(Language::En)).await;
        let today = Utc::now().format("%Y/%m/%d").to_string();
        let result_path = dir.path().join(format!(
            "scans/{today}/whatsapp_919800000000/{}_result.json",
            report.scan_id
        ));

        let mut found = false;
        for _ in 0..100 {
            if result_path.exists() {
                found = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(found, "archive never wrote {}", result_path.display());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn spawned_analysis_outlives_a_dropped_caller() {
        let vision = Arc::new(MockBackend::slow(
            Engine::PrimaryVision,
            Duration::from_millis(300),
            sample_candidate(Engine::PrimaryVision, "rice", "rice_blast"),
        ));
        let pipeline = Arc::new(AnalysisPipeline::builder(kb()).backend(vision.clone()).build());

        let caller = tokio::spawn(Arc::clone(&pipeline).spawn_analysis(request(Language::En)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        for _ in 0..100 {
            if vision.finished() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(vision.finished(), 1, "backend call was cancelled with its caller");
        let snapshot = pipeline.status().engines[0].breaker.clone().unwrap();
        assert_eq!(snapshot.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn spawned_analysis_returns_the_report() {
        let pipeline = Arc::new(AnalysisPipeline::builder(kb()).seed(2).build());
        let report = pipeline.spawn_analysis(request(Language::En)).await.unwrap();
        assert_eq!(report.metadata.engine, Engine::StaticFallback);
    }

    #[test]
    fn crop_hint_is_dropped_when_blank() {
        let req = request(Language::En).with_crop_hint(Some("  ".into()));
        assert!(req.crop_hint.is_none());
    }
}
