// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Meta WhatsApp Cloud API adapter.

use std::time::Duration;

use async_trait::async_trait;
use fasal_config::model::MetaConfig;
use fasal_core::{
    EventKind, FasalError, ImagePayload, InboundEvent, MediaFetcher, MediaRef, OutboundMessage,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::read_media_body;

#[derive(Debug, Default, Deserialize)]
struct Notification {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Default, Deserialize)]
struct Change {
    #[serde(default)]
    value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    from: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<WireText>,
    #[serde(default)]
    image: Option<WireImage>,
}

#[derive(Debug, Deserialize)]
struct WireText {
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct WireImage {
    id: String,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaInfo {
    url: String,
    #[serde(default)]
    mime_type: Option<String>,
}

/// Parses and answers Meta webhook deliveries.
#[derive(Debug, Clone)]
pub struct MetaAdapter {
    client: reqwest::Client,
    graph_base_url: String,
    access_token: Option<String>,
    phone_number_id: Option<String>,
    app_secret: Option<String>,
}

impl MetaAdapter {
    pub fn new(config: &MetaConfig) -> Result<Self, FasalError> {
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
            graph_base_url: config.graph_base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            phone_number_id: config.phone_number_id.clone(),
            app_secret: config.app_secret.clone(),
        })
    }

    /// True when replies can be sent.
    pub fn is_configured(&self) -> bool {
        self.access_token.is_some() && self.phone_number_id.is_some()
    }

    pub fn app_secret(&self) -> Option<&str> {
        self.app_secret.as_deref()
    }

    /// Extracts the first message of a notification.
    ///
    /// Returns `Ok(None)` for notifications without messages (delivery
    /// receipts, status updates). Message types other than text and image
    /// become empty text.
    pub fn parse(&self, body: &[u8]) -> Result<Option<InboundEvent>, FasalError> {
        let raw: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| FasalError::Payload(format!("invalid JSON: {e}")))?;
        let notification: Notification = serde_json::from_value(raw)
            .map_err(|e| FasalError::Payload(format!("unexpected notification shape: {e}")))?;

        let Some(message) = notification
            .entry
            .into_iter()
            .next()
            .and_then(|e| e.changes.into_iter().next())
            .and_then(|c| c.value.messages.into_iter().next())
        else {
            return Ok(None);
        };

        let wire: WireMessage = serde_json::from_value(message.clone())
            .map_err(|e| FasalError::Payload(format!("unexpected message shape: {e}")))?;

        let kind = match (wire.kind.as_str(), wire.image, wire.text) {
            ("image", Some(image), _) => EventKind::Image(MediaRef {
                reference: image.id,
                media_type: image.mime_type,
            }),
            ("text", _, Some(text)) => EventKind::Text(text.body.trim().to_string()),
            (other, _, _) => {
                debug!(kind = other, "unsupported message type, treating as empty text");
                EventKind::Text(String::new())
            }
        };

        Ok(Some(InboundEvent {
            sender_id: wire.from,
            kind,
            raw: message,
        }))
    }

    /// Sends `message` as a text reply.
    ///
    /// Returns `Ok(false)` without calling out when no credentials are
    /// configured.
    pub async fn send(&self, message: &OutboundMessage) -> Result<bool, FasalError> {
        let (Some(token), Some(phone_number_id)) = (&self.access_token, &self.phone_number_id)
        else {
            debug!(to = %message.recipient, "meta credentials missing, reply not sent");
            return Ok(false);
        };

        let url = format!("{}/{phone_number_id}/messages", self.graph_base_url);
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": message.recipient,
            "type": "text",
            "text": {"body": message.text},
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FasalError::Channel {
                message: format!("send request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FasalError::Channel {
                message: format!("graph API returned {status}: {body}"),
                source: None,
            });
        }
        info!(to = %message.recipient, "reply sent via meta");
        Ok(true)
    }

    async fn get(&self, url: &str, token: &str) -> Result<reqwest::Response, FasalError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| FasalError::Media {
                message: format!("request to {url} failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        if !response.status().is_success() {
            return Err(FasalError::Media {
                message: format!("{url} returned {}", response.status()),
                source: None,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl MediaFetcher for MetaAdapter {
    /// Resolves the media id to a download URL, then downloads it.
    async fn fetch(&self, media: &MediaRef, sender: &str) -> Result<ImagePayload, FasalError> {
        let Some(token) = &self.access_token else {
            return Err(FasalError::Media {
                message: "meta access token not configured".into(),
                source: None,
            });
        };

        let info_url = format!("{}/{}", self.graph_base_url, media.reference);
        let info: MediaInfo = self
            .get(&info_url, token)
            .await?
            .json()
            .await
            .map_err(|e| FasalError::Media {
                message: format!("media lookup returned no url: {e}"),
                source: Some(Box::new(e)),
            })?;

        let bytes = read_media_body(self.get(&info.url, token).await?).await?;

        let media_type = media
            .media_type
            .clone()
            .or(info.mime_type)
            .unwrap_or_else(|| "image/jpeg".to_string());
        debug!(media_id = %media.reference, size = bytes.len(), "downloaded meta media");
        Ok(ImagePayload::new(
            bytes,
            media_type,
            format!("whatsapp:{sender}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_MEDIA_BYTES;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(graph: &str) -> MetaAdapter {
        MetaAdapter::new(&MetaConfig {
            access_token: Some("meta-token".into()),
            phone_number_id: Some("pn-555".into()),
            app_secret: None,
            graph_base_url: graph.to_string(),
        })
        .unwrap()
    }

    fn notification(message: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [{"value": {"messages": [message]}}]}]
        }))
        .unwrap()
    }

    #[test]
    fn parses_text_and_image_messages() {
        let meta = adapter("http://unused");
        let text = meta
            .parse(&notification(json!({
                "from": "919800000001", "type": "text", "text": {"body": " 2 "}
            })))
            .unwrap()
            .unwrap();
        assert_eq!(text.sender_id, "919800000001");
        assert_eq!(text.kind, EventKind::Text("2".into()));

        let image = meta
            .parse(&notification(json!({
                "from": "919800000001", "type": "image",
                "image": {"id": "media-42", "mime_type": "image/jpeg"}
            })))
            .unwrap()
            .unwrap();
        assert_eq!(
            image.kind,
            EventKind::Image(MediaRef {
                reference: "media-42".into(),
                media_type: Some("image/jpeg".into()),
            })
        );
    }

    #[test]
    fn other_types_become_empty_text() {
        let meta = adapter("http://unused");
        let event = meta
            .parse(&notification(json!({
                "from": "919800000001", "type": "sticker", "sticker": {"id": "s1"}
            })))
            .unwrap()
            .unwrap();
        assert_eq!(event.kind, EventKind::Text(String::new()));
    }

    #[test]
    fn status_updates_carry_no_message() {
        let meta = adapter("http://unused");
        let body = br#"{"entry":[{"changes":[{"value":{"statuses":[{"id":"x"}]}}]}]}"#;
        assert!(meta.parse(body).unwrap().is_none());
        assert!(meta.parse(b"{}").unwrap().is_none());
    }

    #[test]
    fn malformed_body_is_a_payload_error() {
        let meta = adapter("http://unused");
        assert!(matches!(meta.parse(b"not json"), Err(FasalError::Payload(_))));
    }

    #[tokio::test]
    async fn fetch_resolves_then_downloads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media-42"))
            .and(header("authorization", "Bearer meta-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": format!("{}/download/media-42", server.uri()),
                "mime_type": "image/png"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/download/media-42"))
            .and(header("authorization", "Bearer meta-token"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0x4E, 0x47]))
            .expect(1)
            .mount(&server)
            .await;

        let meta = adapter(&server.uri());
        let media = MediaRef {
            reference: "media-42".into(),
            media_type: None,
        };
        let image = meta.fetch(&media, "919800000001").await.unwrap();
        assert_eq!(image.bytes, vec![0x89, 0x50, 0x4E, 0x47]);
        assert_eq!(image.media_type, "image/png");
        assert_eq!(image.source, "whatsapp:919800000001");
    }

    #[tokio::test]
    async fn fetch_failure_is_a_media_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let media = MediaRef {
            reference: "gone".into(),
            media_type: None,
        };
        let err = adapter(&server.uri()).fetch(&media, "1").await.unwrap_err();
        assert!(matches!(err, FasalError::Media { .. }));
    }

    #[tokio::test]
    async fn oversized_download_is_refused() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media-big"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "url": format!("{}/download/media-big", server.uri()),
                "mime_type": "image/jpeg"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/download/media-big"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; MAX_MEDIA_BYTES + 1]))
            .expect(1)
            .mount(&server)
            .await;

        let media = MediaRef {
            reference: "media-big".into(),
            media_type: None,
        };
        let err = adapter(&server.uri()).fetch(&media, "1").await.unwrap_err();
        assert!(matches!(err, FasalError::Media { .. }));
        assert!(err.to_string().contains("limit"), "{err}");
    }

    #[tokio::test]
    async fn send_posts_a_text_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pn-555/messages"))
            .and(header("authorization", "Bearer meta-token"))
            .and(body_json(json!({
                "messaging_product": "whatsapp",
                "to": "919800000001",
                "type": "text",
                "text": {"body": "namaste"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messages": [{"id": "wamid"}]})))
            .expect(1)
            .mount(&server)
            .await;

        let sent = adapter(&server.uri())
            .send(&OutboundMessage {
                recipient: "919800000001".into(),
                text: "namaste".into(),
            })
            .await
            .unwrap();
        assert!(sent);
    }

    #[tokio::test]
    async fn send_without_credentials_is_skipped() {
        let meta = MetaAdapter::new(&MetaConfig::default()).unwrap();
        assert!(!meta.is_configured());
        let sent = meta
            .send(&OutboundMessage {
                recipient: "1".into(),
                text: "x".into(),
            })
            .await
            .unwrap();
        assert!(!sent);
    }
}
