// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the pluggable collaborators of the service.
//!
//! Async traits use `#[async_trait]` so they can be held as trait objects.

pub mod archive;
pub mod backend;
pub mod knowledge;
pub mod media;
pub mod translate;

// Re-export all traits at the traits module level for convenience.
pub use archive::ScanArchive;
pub use backend::DiagnosisBackend;
pub use knowledge::KnowledgeBase;
pub use media::MediaFetcher;
pub use translate::Translator;
