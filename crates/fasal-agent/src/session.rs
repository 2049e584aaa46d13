// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user chat sessions and the locks that serialize turns per sender.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use fasal_core::Language;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// What is remembered about a sender between turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserSession {
    pub language: Language,
    /// False until the sender has picked a language from the menu, and again
    /// after they ask to change it.
    pub language_confirmed: bool,
}

impl UserSession {
    /// Session of a sender who has been shown the menu but not answered it.
    pub fn awaiting(language: Language) -> Self {
        Self {
            language,
            language_confirmed: false,
        }
    }

    pub fn active(language: Language) -> Self {
        Self {
            language,
            language_confirmed: true,
        }
    }

    pub fn state(&self) -> ConversationState {
        if self.language_confirmed {
            ConversationState::Active(self.language)
        } else {
            ConversationState::AwaitingLanguage
        }
    }
}

/// Where a sender is in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    /// Never seen before.
    New,
    /// Menu shown, waiting for a selector.
    AwaitingLanguage,
    /// Language chosen; images are analyzed.
    Active(Language),
}

impl ConversationState {
    pub fn of(session: Option<&UserSession>) -> Self {
        session.map_or(ConversationState::New, UserSession::state)
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversationState::New => write!(f, "new"),
            ConversationState::AwaitingLanguage => write!(f, "awaiting_language"),
            ConversationState::Active(language) => write!(f, "active[{language}]"),
        }
    }
}

impl Serialize for ConversationState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Storage for sessions keyed by sender id.
///
/// The in-memory implementation loses everything on restart; a persistent
/// store only has to implement these three calls.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn get(&self, sender: &str) -> Option<UserSession>;

    async fn put(&self, sender: &str, session: UserSession);

    /// Number of known senders.
    async fn count(&self) -> usize;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, UserSession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, sender: &str) -> Option<UserSession> {
        self.sessions.get(sender).map(|s| *s)
    }

    async fn put(&self, sender: &str, session: UserSession) {
        self.sessions.insert(sender.to_string(), session);
    }

    async fn count(&self) -> usize {
        self.sessions.len()
    }
}

/// One async mutex per sender, created on first use.
#[derive(Debug, Default)]
pub struct SenderLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SenderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `sender`'s session.
    pub async fn acquire(&self, sender: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(sender.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
