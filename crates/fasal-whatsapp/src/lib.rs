// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp webhook channel.
//!
//! One webhook URL serves both providers. The content type of each
//! delivery selects the adapter: Meta pushes JSON and gets its reply over
//! the Graph API, Twilio posts a form and gets its reply inline as TwiML.
//! Both feed the same [`ConversationService`].

pub mod meta;
pub mod protocol;
pub mod signature;
pub mod twilio;

use axum::Json;
use axum::response::{IntoResponse, Response};
use fasal_agent::{BILINGUAL_APOLOGY, ConversationService};
use fasal_config::model::WhatsAppConfig;
use fasal_core::{FasalError, Language};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode, Uri};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

pub use meta::MetaAdapter;
pub use protocol::Protocol;
pub use twilio::{TwilioAdapter, escape_xml, twiml};

/// Largest media download accepted from a provider.
pub const MAX_MEDIA_BYTES: usize = 10 * 1024 * 1024;

/// Path the webhook is mounted at.
pub const WEBHOOK_PATH: &str = "/api/whatsapp/webhook";

/// Alias kept for Twilio sandboxes configured against the older path.
pub const TWILIO_ALIAS_PATH: &str = "/api/whatsapp/twilio";

/// Reads a media body, giving up as soon as it passes [`MAX_MEDIA_BYTES`].
///
/// A declared `Content-Length` over the limit is rejected before any of the
/// body is read.
pub(crate) async fn read_media_body(mut response: reqwest::Response) -> Result<Vec<u8>, FasalError> {
    let too_large = |size: u64| FasalError::Media {
        message: format!("media is {size} bytes, limit is {MAX_MEDIA_BYTES}"),
        source: None,
    };
    if let Some(declared) = response.content_length()
        && declared > MAX_MEDIA_BYTES as u64
    {
        return Err(too_large(declared));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| FasalError::Media {
        message: format!("failed to read media body: {e}"),
        source: Some(Box::new(e)),
    })? {
        if body.len() + chunk.len() > MAX_MEDIA_BYTES {
            return Err(too_large((body.len() + chunk.len()) as u64));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageOption {
    pub code: &'static str,
    pub name: &'static str,
    pub native: &'static str,
}

/// Body of the channel status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelStatus {
    /// `configured` when any provider can reply, otherwise `demo_mode`.
    pub status: &'static str,
    pub providers: Vec<&'static str>,
    pub webhook_url: String,
    pub verify_token_set: bool,
    pub signature_checks: Vec<&'static str>,
    pub supported_languages: Vec<LanguageOption>,
    pub active_sessions: usize,
}

/// Both provider adapters plus the subscription handshake.
#[derive(Debug, Clone)]
pub struct WhatsAppChannel {
    meta: MetaAdapter,
    twilio: TwilioAdapter,
    verify_token: String,
    public_url: Option<String>,
}

impl WhatsAppChannel {
    pub fn from_config(config: &WhatsAppConfig) -> Result<Self, FasalError> {
        Ok(Self {
            meta: MetaAdapter::new(&config.meta)?,
            twilio: TwilioAdapter::new(&config.twilio)?,
            verify_token: config.verify_token.clone(),
            public_url: config
                .public_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
        })
    }

    pub fn meta(&self) -> &MetaAdapter {
        &self.meta
    }

    pub fn twilio(&self) -> &TwilioAdapter {
        &self.twilio
    }

    /// Answers the subscription handshake: the challenge when mode is
    /// `subscribe` and the token matches, otherwise `None`.
    pub fn verify_subscription(
        &self,
        mode: Option<&str>,
        token: Option<&str>,
        challenge: Option<&str>,
    ) -> Option<String> {
        match (mode, token, challenge) {
            (Some("subscribe"), Some(token), Some(challenge)) if token == self.verify_token => {
                info!("webhook subscription verified");
                Some(challenge.to_string())
            }
            _ => {
                warn!(?mode, "webhook verification rejected");
                None
            }
        }
    }

    pub fn status(&self, active_sessions: usize) -> ChannelStatus {
        let mut providers = Vec::new();
        if self.meta.is_configured() {
            providers.push(Protocol::PushJson.provider());
        }
        if self.twilio.is_configured() {
            providers.push(Protocol::FormPost.provider());
        }
        let mut signature_checks = Vec::new();
        if self.meta.app_secret().is_some() {
            signature_checks.push(Protocol::PushJson.provider());
        }
        if self.twilio_signing().is_some() {
            signature_checks.push(Protocol::FormPost.provider());
        }

        ChannelStatus {
            status: if providers.is_empty() {
                "demo_mode"
            } else {
                "configured"
            },
            providers,
            webhook_url: format!(
                "{}{WEBHOOK_PATH}",
                self.public_url.as_deref().unwrap_or("")
            ),
            verify_token_set: !self.verify_token.is_empty(),
            signature_checks,
            supported_languages: Language::ALL
                .iter()
                .map(|l| LanguageOption {
                    code: l.code(),
                    name: l.english_name(),
                    native: l.native_name(),
                })
                .collect(),
            active_sessions,
        }
    }

    fn twilio_signing(&self) -> Option<(&str, &str)> {
        Some((self.twilio.auth_token()?, self.public_url.as_deref()?))
    }

    /// Handles one webhook delivery and builds the provider's response.
    pub async fn deliver(
        &self,
        conversations: &ConversationService,
        uri: &Uri,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Response {
        let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        match Protocol::detect(content_type) {
            Protocol::PushJson => self.deliver_push(conversations, headers, body).await,
            Protocol::FormPost => self.deliver_form(conversations, uri, headers, body).await,
        }
    }

    async fn deliver_push(
        &self,
        conversations: &ConversationService,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Response {
        if let Some(secret) = self.meta.app_secret() {
            let header = headers
                .get(signature::META_HEADER)
                .and_then(|v| v.to_str().ok());
            if !signature::verify_meta(secret, body, header) {
                warn!("meta delivery failed signature check");
                return StatusCode::FORBIDDEN.into_response();
            }
        }

        let event = match self.meta.parse(body) {
            Ok(Some(event)) => event,
            Ok(None) => return Json(json!({"status": "no messages"})).into_response(),
            Err(e) => {
                warn!(error = %e, "malformed meta delivery");
                return Json(json!({"status": "error", "detail": e.to_string()})).into_response();
            }
        };

        let outcome = conversations.handle(&event, Some(&self.meta)).await;
        let sent = match self.meta.send(&outcome.reply).await {
            Ok(sent) => sent,
            Err(e) => {
                warn!(error = %e, to = %outcome.reply.recipient, "meta reply failed");
                false
            }
        };
        Json(json!({
            "status": "processed",
            "state": outcome.state,
            "sent": sent,
        }))
        .into_response()
    }

    async fn deliver_form(
        &self,
        conversations: &ConversationService,
        uri: &Uri,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Response {
        let fields = match twilio::form_fields(body) {
            Ok(fields) => fields,
            Err(e) => {
                warn!(error = %e, "malformed twilio delivery");
                return twiml_response(BILINGUAL_APOLOGY);
            }
        };

        if let Some((token, public_url)) = self.twilio_signing() {
            let url = format!(
                "{public_url}{}",
                uri.path_and_query().map_or(WEBHOOK_PATH, |p| p.as_str())
            );
            let header = headers
                .get(signature::TWILIO_HEADER)
                .and_then(|v| v.to_str().ok());
            if !signature::verify_twilio(token, &url, &fields, header) {
                warn!("twilio delivery failed signature check");
                return StatusCode::FORBIDDEN.into_response();
            }
        }

        let event = match self.twilio.parse(&fields) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "unusable twilio delivery");
                return twiml_response(BILINGUAL_APOLOGY);
            }
        };

        let outcome = conversations.handle(&event, Some(&self.twilio)).await;
        twiml_response(&outcome.reply.text)
    }
}

fn twiml_response(text: &str) -> Response {
    (
        [(CONTENT_TYPE, "application/xml; charset=utf-8")],
        twiml(text),
    )
        .into_response()
}
