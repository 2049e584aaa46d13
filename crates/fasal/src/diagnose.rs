// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `fasal diagnose`: one pipeline run from the command line.

use std::path::Path;
use std::sync::Arc;

use fasal_config::FasalConfig;
use fasal_core::{FasalError, ImagePayload, KnowledgeBase, Language};
use fasal_knowledge::StaticKnowledgeBase;
use fasal_pipeline::{AnalysisPipeline, AnalysisRequest};

use crate::serve::init_tracing;

fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

pub async fn run_diagnose(
    config: &FasalConfig,
    image: &Path,
    language: &str,
    crop: Option<String>,
) -> Result<(), FasalError> {
    init_tracing(&config.server.log_level);

    let bytes = tokio::fs::read(image).await.map_err(|e| {
        FasalError::Internal(format!("cannot read {}: {e}", image.display()))
    })?;
    let language = Language::from_code_or_base(language);

    // Nothing is archived from the command line.
    let mut config = config.clone();
    config.archive.enabled = false;

    let kb: Arc<dyn KnowledgeBase> = Arc::new(StaticKnowledgeBase::builtin()?);
    let pipeline = AnalysisPipeline::from_config(&config, kb)?;
    let payload = ImagePayload::new(bytes, media_type_for(image), "cli");
    let report = pipeline
        .analyze(AnalysisRequest::new(payload, language).with_crop_hint(crop))
        .await;

    let json = serde_json::to_string_pretty(&report.to_response())
        .map_err(|e| FasalError::Internal(format!("cannot serialize report: {e}")))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_follows_extension() {
        assert_eq!(media_type_for(Path::new("leaf.PNG")), "image/png");
        assert_eq!(media_type_for(Path::new("leaf.webp")), "image/webp");
        assert_eq!(media_type_for(Path::new("leaf.jpeg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("leaf")), "image/jpeg");
    }
}
