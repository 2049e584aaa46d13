// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Machine translation trait.

use async_trait::async_trait;

use crate::error::FasalError;
use crate::types::Language;

#[async_trait]
pub trait Translator: Send + Sync + 'static {
    /// Translates `text` from `source` into `target`.
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, FasalError>;
}
