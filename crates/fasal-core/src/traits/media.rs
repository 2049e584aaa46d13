// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media download trait implemented by chat provider adapters.

use async_trait::async_trait;

use crate::error::FasalError;
use crate::types::{ImagePayload, MediaRef};

/// Downloads media a chat provider only hands out by reference.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetches `media` sent by `sender` and wraps it as an image payload.
    async fn fetch(&self, media: &MediaRef, sender: &str) -> Result<ImagePayload, FasalError>;
}
