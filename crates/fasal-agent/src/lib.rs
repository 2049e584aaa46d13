// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat conversation layer.
//!
//! New senders are asked to pick one of nine languages. Once a language is
//! chosen, photos are run through the analysis pipeline and answered with a
//! formatted diagnosis; text gets greeting, help or fallback replies.
//! Transitions live in [`engine`] and do no I/O; [`ConversationService`]
//! applies them against a [`SessionStore`].

pub mod classify;
pub mod engine;
pub mod format;
pub mod i18n;
pub mod service;
pub mod session;

pub use engine::{Action, Decision, decide};
pub use format::format_diagnosis;
pub use i18n::{BILINGUAL_APOLOGY, catalog};
pub use service::{ConversationService, TurnOutcome};
pub use session::{ConversationState, InMemorySessionStore, SessionStore, UserSession};
