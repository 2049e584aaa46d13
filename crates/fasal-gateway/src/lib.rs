// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API for the diagnosis service.
//!
//! Web clients upload photos to the analyze endpoints; WhatsApp providers
//! call the webhook. Both end in the same [`fasal_pipeline::AnalysisPipeline`].

pub mod error;
pub mod handlers;
pub mod server;
pub mod whatsapp;

pub use error::ApiError;
pub use server::{AppState, router, start_server};
