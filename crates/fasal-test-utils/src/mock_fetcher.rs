// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock media fetcher for chat-flow tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use fasal_core::{FasalError, ImagePayload, MediaFetcher, MediaRef};

/// Hands out fixed image bytes, or always fails.
pub struct MockFetcher {
    bytes: Option<Vec<u8>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn returning(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            bytes: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaFetcher for MockFetcher {
    async fn fetch(&self, media: &MediaRef, sender: &str) -> Result<ImagePayload, FasalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.bytes {
            Some(bytes) => Ok(ImagePayload::new(
                bytes.clone(),
                media.media_type.as_deref().unwrap_or("image/jpeg"),
                sender,
            )),
            None => Err(FasalError::Media {
                message: format!("scripted failure for {}", media.reference),
                source: None,
            }),
        }
    }
}
