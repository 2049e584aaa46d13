// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the FasalDrishti diagnosis service.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the workspace. Diagnosis backends, the
//! knowledge base, translators, archives and chat media fetchers all
//! implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FasalError;
pub use types::{
    CropInfo, DiagnosisCandidate, DiseaseRecord, Engine, EventKind, ImagePayload,
    InboundEvent, Language, LocalizedText, MediaRef, OutboundMessage, ScanRecord, Severity,
    Treatment, HEALTHY_KEY,
};

pub use traits::{DiagnosisBackend, KnowledgeBase, MediaFetcher, ScanArchive, Translator};
