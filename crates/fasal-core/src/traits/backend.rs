// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnosis backend trait for the engines tried by the fallback chain.

use async_trait::async_trait;

use crate::error::FasalError;
use crate::types::{DiagnosisCandidate, Engine, ImagePayload};

/// One source of crop-disease diagnoses.
///
/// Each implementation keeps its own wire format private and returns the
/// common [`DiagnosisCandidate`]. An `Err` means the backend is unavailable
/// for this call; the caller decides what happens next.
#[async_trait]
pub trait DiagnosisBackend: Send + Sync + 'static {
    /// Returns which engine this backend is.
    fn engine(&self) -> Engine;

    /// Diagnoses `image`. `crop_hint` is what the farmer said they are growing, if anything.
    async fn diagnose(
        &self,
        image: &ImagePayload,
        crop_hint: Option<&str>,
    ) -> Result<DiagnosisCandidate, FasalError>;
}
