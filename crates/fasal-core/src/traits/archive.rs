// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scan archive trait for storing submitted images with their results.

use async_trait::async_trait;

use crate::error::FasalError;
use crate::types::ScanRecord;

#[async_trait]
pub trait ScanArchive: Send + Sync + 'static {
    /// Persists the image and result of one scan. Returns the image's storage key.
    async fn store(&self, scan: &ScanRecord) -> Result<String, FasalError>;
}
