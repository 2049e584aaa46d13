// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analysis, knowledge-base and health handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use base64::Engine as _;
use fasal_core::{CropInfo, DiseaseRecord, ImagePayload, Language, Severity};
use fasal_pipeline::{AnalysisRequest, AnalyzeResponse, PipelineStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::server::AppState;

/// Largest accepted image.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const ACCEPTED_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Checks size and declared type; `image/jpg` is normalized to `image/jpeg`.
pub fn validate_image(bytes: &[u8], media_type: &str) -> Result<String, ApiError> {
    let media_type = media_type.trim().to_ascii_lowercase();
    if !ACCEPTED_MEDIA_TYPES.contains(&media_type.as_str()) {
        return Err(ApiError::bad_request(format!(
            "unsupported image type '{media_type}', use JPEG, PNG or WebP"
        )));
    }
    if bytes.is_empty() {
        return Err(ApiError::bad_request("image is empty"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::bad_request(format!(
            "image is {} bytes, limit is 10 MB",
            bytes.len()
        )));
    }
    Ok(if media_type == "image/jpg" {
        "image/jpeg".to_string()
    } else {
        media_type
    })
}

/// Runs the pipeline on its own task so a client disconnect does not
/// cancel backend calls.
async fn run_analysis(
    state: &AppState,
    image: ImagePayload,
    language: Option<&str>,
    crop_hint: Option<String>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let language = language.map_or(Language::BASE, Language::from_code_or_base);
    let request = AnalysisRequest::new(image, language).with_crop_hint(crop_hint);
    let report = Arc::clone(&state.pipeline)
        .spawn_analysis(request)
        .await
        .map_err(|e| {
            warn!(error = %e, "analysis did not complete");
            ApiError::internal("analysis failed")
        })?;
    Ok(Json(report.to_response()))
}

/// POST /api/analyze (multipart: `file`, `language`, `crop_hint`).
pub async fn analyze_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut file: Option<(Vec<u8>, String)> = None;
    let mut language = None;
    let mut crop_hint = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read file: {e}")))?;
                file = Some((bytes.to_vec(), media_type));
            }
            Some("language") => language = field.text().await.ok(),
            Some("crop_hint") => crop_hint = field.text().await.ok(),
            other => debug!(field = ?other, "ignoring multipart field"),
        }
    }

    let (bytes, media_type) = file.ok_or_else(|| ApiError::bad_request("missing 'file' field"))?;
    let media_type = validate_image(&bytes, &media_type)?;
    info!(size = bytes.len(), %media_type, "image uploaded");

    let image = ImagePayload::new(bytes, media_type, "web");
    run_analysis(&state, image, language.as_deref(), crop_hint).await
}

#[derive(Debug, Deserialize)]
pub struct Base64Request {
    pub image_base64: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub crop_hint: Option<String>,
}

/// Splits an optional `data:<type>;base64,` prefix from the payload.
fn split_data_uri(data: &str) -> (Option<&str>, &str) {
    match data.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
        Some((header, payload)) => {
            let media_type = header.split(';').next().filter(|t| !t.is_empty());
            (media_type, payload)
        }
        None => (None, data),
    }
}

/// POST /api/analyze/base64
pub async fn analyze_base64(
    State(state): State<AppState>,
    Json(body): Json<Base64Request>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let (uri_type, payload) = split_data_uri(body.image_base64.trim());
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ApiError::bad_request(format!("invalid base64 image: {e}")))?;
    let declared = body
        .media_type
        .as_deref()
        .or(uri_type)
        .unwrap_or("image/jpeg");
    let media_type = validate_image(&bytes, declared)?;
    info!(size = bytes.len(), %media_type, "base64 image received");

    let image = ImagePayload::new(bytes, media_type, "web");
    run_analysis(&state, image, body.language.as_deref(), body.crop_hint).await
}

#[derive(Debug, Serialize)]
pub struct DiseaseSummary {
    pub disease_name: String,
    pub hindi_name: String,
    pub crop: String,
    pub category: String,
    pub severity_typical: Severity,
}

#[derive(Debug, Serialize)]
pub struct DiseaseList {
    pub total: usize,
    pub diseases: BTreeMap<String, DiseaseSummary>,
}

/// GET /api/diseases
pub async fn list_diseases(State(state): State<AppState>) -> Json<DiseaseList> {
    let diseases: BTreeMap<_, _> = state
        .pipeline
        .knowledge()
        .records()
        .into_iter()
        .map(|r| {
            (
                r.key.clone(),
                DiseaseSummary {
                    disease_name: r.disease_name.clone(),
                    hindi_name: r.local_name(Language::Hi).to_string(),
                    crop: r.crop.clone(),
                    category: r.category.clone(),
                    severity_typical: r.severity_typical,
                },
            )
        })
        .collect();
    Json(DiseaseList {
        total: diseases.len(),
        diseases,
    })
}

/// GET /api/diseases/{key}
pub async fn get_disease(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DiseaseRecord>, ApiError> {
    state
        .pipeline
        .knowledge()
        .get(&key.to_lowercase())
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Disease not found"))
}

#[derive(Debug, Serialize)]
pub struct CropList {
    pub crops: Vec<CropInfo>,
}

/// GET /api/crops
pub async fn list_crops(State(state): State<AppState>) -> Json<CropList> {
    Json(CropList {
        crops: state.pipeline.knowledge().crops().to_vec(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

/// GET /health and /api/health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "FasalDrishti API",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// GET /api/pipeline
pub async fn get_pipeline(State(state): State<AppState>) -> Json<PipelineStatus> {
    Json(state.pipeline.status())
}
