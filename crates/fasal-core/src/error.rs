// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the FasalDrishti diagnosis service.

use thiserror::Error;

use crate::types::Engine;

/// The primary error type used across all traits and core operations.
#[derive(Debug, Error)]
pub enum FasalError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// A diagnosis backend failed (transport, auth rejection, unparseable answer).
    #[error("{engine} backend error: {message}")]
    Backend {
        engine: Engine,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Image download from a chat provider failed.
    #[error("media retrieval error: {message}")]
    Media {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Translation service errors.
    #[error("translation error: {message}")]
    Translation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Scan archive errors (filesystem, serialization).
    #[error("archive error: {source}")]
    Archive {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Malformed inbound webhook payload.
    #[error("malformed payload: {0}")]
    Payload(String),

    /// Chat channel errors (outbound send failure, provider rejection).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FasalError {
    /// Shorthand for a backend failure without an underlying cause.
    pub fn backend(engine: Engine, message: impl Into<String>) -> Self {
        FasalError::Backend {
            engine,
            message: message.into(),
            source: None,
        }
    }
}
