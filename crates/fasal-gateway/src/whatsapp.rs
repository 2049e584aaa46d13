// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp webhook, status and simulation handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use fasal_agent::ConversationState;
use fasal_core::{InboundEvent, Language};
use fasal_whatsapp::ChannelStatus;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// GET /api/whatsapp/webhook
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    match state.whatsapp.verify_subscription(
        params.mode.as_deref(),
        params.token.as_deref(),
        params.challenge.as_deref(),
    ) {
        Some(challenge) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            challenge,
        )
            .into_response(),
        None => (StatusCode::FORBIDDEN, "Verification failed").into_response(),
    }
}

/// POST /api/whatsapp/webhook and /api/whatsapp/twilio
///
/// The turn, including any out-of-band reply, runs on its own task so a
/// provider that hangs up early does not cancel it.
pub async fn receive_webhook(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let turn = tokio::spawn(async move {
        state
            .whatsapp
            .deliver(&state.conversations, &uri, &headers, &body)
            .await
    });
    match turn.await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "webhook turn did not complete");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /api/whatsapp/status
pub async fn channel_status(State(state): State<AppState>) -> Json<ChannelStatus> {
    let sessions = state.conversations.session_count().await;
    Json(state.whatsapp.status(sessions))
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    #[serde(default = "default_sender")]
    pub from: String,
    pub message: String,
    /// Pre-selects the sender's language, skipping the menu.
    #[serde(default)]
    pub language: Option<String>,
}

fn default_sender() -> String {
    "simulator".to_string()
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub from: String,
    pub reply: String,
    pub state: ConversationState,
}

/// POST /api/whatsapp/simulate
///
/// Runs a text turn with no provider attached, so nothing is sent and
/// images cannot be fetched.
pub async fn simulate(
    State(state): State<AppState>,
    Json(body): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, ApiError> {
    if body.from.trim().is_empty() {
        return Err(ApiError::bad_request("'from' must not be empty"));
    }
    if let Some(code) = body.language.as_deref() {
        let language: Language = code
            .parse()
            .map_err(|_| ApiError::bad_request(format!("unsupported language '{code}'")))?;
        if state.conversations.state_of(&body.from).await != ConversationState::Active(language) {
            state.conversations.set_language(&body.from, language).await;
        }
    }

    let event = InboundEvent::text(body.from.clone(), body.message);
    let outcome = state.conversations.handle(&event, None).await;
    Ok(Json(SimulateResponse {
        from: body.from,
        reply: outcome.reply.text,
        state: outcome.state,
    }))
}
