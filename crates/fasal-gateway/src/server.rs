// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use fasal_agent::{ConversationService, InMemorySessionStore};
use fasal_config::FasalConfig;
use fasal_core::{FasalError, KnowledgeBase};
use fasal_pipeline::AnalysisPipeline;
use fasal_whatsapp::{TWILIO_ALIAS_PATH, WEBHOOK_PATH, WhatsAppChannel};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::whatsapp;

/// Request bodies up to this size are read; base64 adds a third to a
/// 10 MB image.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub conversations: Arc<ConversationService>,
    pub whatsapp: Arc<WhatsAppChannel>,
    /// Process start time for uptime calculation.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        pipeline: Arc<AnalysisPipeline>,
        conversations: Arc<ConversationService>,
        whatsapp: Arc<WhatsAppChannel>,
    ) -> Self {
        Self {
            pipeline,
            conversations,
            whatsapp,
            started_at: Instant::now(),
        }
    }

    /// Wires the pipeline, an in-memory session store and the WhatsApp
    /// channel from configuration.
    pub fn from_config(
        config: &FasalConfig,
        kb: Arc<dyn KnowledgeBase>,
    ) -> Result<Self, FasalError> {
        let pipeline = Arc::new(AnalysisPipeline::from_config(config, kb)?);
        let conversations = Arc::new(ConversationService::new(
            Arc::clone(&pipeline),
            Arc::new(InMemorySessionStore::new()),
        ));
        let whatsapp = Arc::new(WhatsAppChannel::from_config(&config.whatsapp)?);
        Ok(Self::new(pipeline, conversations, whatsapp))
    }
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "FasalDrishti API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "description": "AI-Powered Crop Disease Detection for Indian Farmers",
    }))
}

/// Builds the full route table.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::get_health))
        .route("/api/health", get(handlers::get_health))
        .route("/api/analyze", post(handlers::analyze_upload))
        .route("/api/analyze/base64", post(handlers::analyze_base64))
        .route("/api/diseases", get(handlers::list_diseases))
        .route("/api/diseases/{key}", get(handlers::get_disease))
        .route("/api/crops", get(handlers::list_crops))
        .route("/api/pipeline", get(handlers::get_pipeline))
        .route(
            WEBHOOK_PATH,
            get(whatsapp::verify_webhook).post(whatsapp::receive_webhook),
        )
        .route(TWILIO_ALIAS_PATH, post(whatsapp::receive_webhook))
        .route("/api/whatsapp/status", get(whatsapp::channel_status))
        .route("/api/whatsapp/simulate", post(whatsapp::simulate))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `host:port` and serves until `shutdown` resolves.
pub async fn start_server(
    host: &str,
    port: u16,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), FasalError> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FasalError::Channel {
            message: format!("failed to bind server to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("FasalDrishti API listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| FasalError::Channel {
            message: format!("server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
