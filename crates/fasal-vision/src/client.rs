// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Messages API with an ordered list of auth strategies.
//!
//! API-key auth is tried first. If it is not configured or the call fails, a
//! bearer token is tried against its own endpoint. Only when every strategy
//! has failed does the client report an error.

use std::time::Duration;

use fasal_config::model::VisionConfig;
use fasal_core::{Engine, FasalError};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// How a request authenticates.
#[derive(Clone)]
pub enum AuthStrategy {
    /// `x-api-key` header.
    ApiKey(String),
    /// `Authorization: Bearer` header.
    Bearer(String),
}

impl AuthStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            AuthStrategy::ApiKey(_) => "api_key",
            AuthStrategy::Bearer(_) => "bearer",
        }
    }
}

impl std::fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}([redacted])", self.label())
    }
}

#[derive(Debug, Clone)]
struct AuthRoute {
    auth: AuthStrategy,
    url: String,
}

/// Messages API client.
#[derive(Debug, Clone)]
pub struct VisionClient {
    client: reqwest::Client,
    routes: Vec<AuthRoute>,
}

impl VisionClient {
    /// Builds a client from config. Fails when no credential is configured.
    pub fn new(config: &VisionConfig) -> Result<Self, FasalError> {
        let mut routes = Vec::new();
        if let Some(key) = &config.api_key {
            routes.push(AuthRoute {
                auth: AuthStrategy::ApiKey(key.clone()),
                url: messages_url(&config.base_url),
            });
        }
        if let Some(token) = &config.bearer_token {
            let base = config.bearer_base_url.as_deref().unwrap_or(&config.base_url);
            routes.push(AuthRoute {
                auth: AuthStrategy::Bearer(token.clone()),
                url: messages_url(base),
            });
        }
        if routes.is_empty() {
            return Err(FasalError::Config(
                "vision backend needs vision.api_key or vision.bearer_token".into(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(&config.api_version).map_err(|e| {
                FasalError::Config(format!("invalid API version header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FasalError::Backend {
                engine: Engine::PrimaryVision,
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client, routes })
    }

    /// Labels of the configured strategies, in the order they are tried.
    pub fn strategies(&self) -> Vec<&'static str> {
        self.routes.iter().map(|r| r.auth.label()).collect()
    }

    /// Sends `request`, trying each auth strategy in turn.
    ///
    /// Returns the response with the label of the strategy that succeeded.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<(MessageResponse, &'static str), FasalError> {
        let mut last_error = None;
        for route in &self.routes {
            match self.send(route, request).await {
                Ok(response) => return Ok((response, route.auth.label())),
                Err(e) => {
                    warn!(auth = route.auth.label(), error = %e, "vision request failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            FasalError::backend(Engine::PrimaryVision, "no auth strategy configured")
        }))
    }

    async fn send(
        &self,
        route: &AuthRoute,
        request: &MessageRequest,
    ) -> Result<MessageResponse, FasalError> {
        let builder = self.client.post(&route.url).json(request);
        let builder = match &route.auth {
            AuthStrategy::ApiKey(key) => builder.header("x-api-key", key),
            AuthStrategy::Bearer(token) => builder.bearer_auth(token),
        };

        let response = builder.send().await.map_err(|e| FasalError::Backend {
            engine: Engine::PrimaryVision,
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        debug!(status = %status, auth = route.auth.label(), "vision response received");

        let body = response.text().await.map_err(|e| FasalError::Backend {
            engine: Engine::PrimaryVision,
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "API error ({}): {}",
                    api_err.error.type_, api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(FasalError::backend(Engine::PrimaryVision, message));
        }

        serde_json::from_str(&body).map_err(|e| FasalError::Backend {
            engine: Engine::PrimaryVision,
            message: format!("failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

fn messages_url(base: &str) -> String {
    format!("{}/v1/messages", base.trim_end_matches('/'))
}
