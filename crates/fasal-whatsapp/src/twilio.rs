// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio WhatsApp adapter. Replies are returned inline as TwiML.

use std::time::Duration;

use async_trait::async_trait;
use fasal_config::model::TwilioConfig;
use fasal_core::{EventKind, FasalError, ImagePayload, InboundEvent, MediaFetcher, MediaRef};
use tracing::debug;

use crate::read_media_body;

/// Decodes a form body into its fields, in post order.
pub fn form_fields(body: &[u8]) -> Result<Vec<(String, String)>, FasalError> {
    serde_urlencoded::from_bytes(body)
        .map_err(|e| FasalError::Payload(format!("invalid form body: {e}")))
}

/// Escapes text for an XML element body.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps `text` in a single-message TwiML response.
pub fn twiml(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n    <Message>{}</Message>\n</Response>",
        escape_xml(text)
    )
}

#[derive(Debug, Clone)]
pub struct TwilioAdapter {
    client: reqwest::Client,
    account_sid: Option<String>,
    auth_token: Option<String>,
    whatsapp_number: Option<String>,
}

impl TwilioAdapter {
    pub fn new(config: &TwilioConfig) -> Result<Self, FasalError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FasalError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            whatsapp_number: config.whatsapp_number.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some()
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn whatsapp_number(&self) -> Option<&str> {
        self.whatsapp_number.as_deref()
    }

    /// Builds the canonical event from decoded form fields.
    ///
    /// A post with at least one media item becomes an image event; the
    /// text body is ignored in that case.
    pub fn parse(&self, fields: &[(String, String)]) -> Result<InboundEvent, FasalError> {
        let field = |name: &str| {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        let from = field("From").unwrap_or_default();
        if from.is_empty() {
            return Err(FasalError::Payload("missing From field".into()));
        }

        let num_media: u32 = field("NumMedia")
            .and_then(|n| n.trim().parse().ok())
            .unwrap_or(0);
        let kind = match field("MediaUrl0").filter(|url| !url.is_empty()) {
            Some(url) if num_media > 0 => EventKind::Image(MediaRef {
                reference: url.to_string(),
                media_type: field("MediaContentType0").map(str::to_string),
            }),
            _ => EventKind::Text(field("Body").unwrap_or_default().trim().to_string()),
        };

        let raw = serde_json::Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        );
        debug!(from, to = field("To").unwrap_or_default(), num_media, "twilio message parsed");
        Ok(InboundEvent {
            sender_id: from.to_string(),
            kind,
            raw,
        })
    }
}

#[async_trait]
impl MediaFetcher for TwilioAdapter {
    /// Downloads a media URL, with basic auth when credentials are configured.
    async fn fetch(&self, media: &MediaRef, sender: &str) -> Result<ImagePayload, FasalError> {
        let mut request = self.client.get(&media.reference);
        if let (Some(sid), Some(token)) = (&self.account_sid, &self.auth_token) {
            request = request.basic_auth(sid, Some(token));
        }

        let response = request.send().await.map_err(|e| FasalError::Media {
            message: format!("media download failed: {e}"),
            source: Some(Box::new(e)),
        })?;
        if !response.status().is_success() {
            return Err(FasalError::Media {
                message: format!("media download returned {}", response.status()),
                source: None,
            });
        }

        let header_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = read_media_body(response).await?;

        let media_type = media
            .media_type
            .clone()
            .or(header_type)
            .unwrap_or_else(|| "image/jpeg".to_string());
        debug!(size = bytes.len(), %media_type, "downloaded twilio media");
        Ok(ImagePayload::new(bytes, media_type, sender))
    }
}
