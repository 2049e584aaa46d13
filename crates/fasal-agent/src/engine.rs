// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure conversation transitions.
//!
//! `decide` maps the current state and one inbound event to the next
//! session and an action. It does no I/O; the service applies the result.
//!
//! | state              | event                 | next               | action            |
//! |--------------------|-----------------------|--------------------|-------------------|
//! | new                | anything              | awaiting language  | menu              |
//! | awaiting language  | selector `1`..`9`     | active             | confirmation      |
//! | awaiting language  | anything else         | unchanged          | menu              |
//! | active             | selector              | active (new lang)  | confirmation      |
//! | active             | change-language cmd   | awaiting language  | menu              |
//! | active             | greeting / help / text| unchanged          | catalogue reply   |
//! | active             | image                 | unchanged          | analyze           |

use fasal_core::{EventKind, Language, MediaRef};

use crate::classify::{Intent, classify, is_change_language};
use crate::i18n::{catalog, confirmation, language_menu, parse_selector};
use crate::session::{ConversationState, UserSession};

/// What the service must do for this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Reply(String),
    /// Fetch the media and run the pipeline, replying in `language`.
    Analyze { media: MediaRef, language: Language },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Session to store; `None` leaves the stored session untouched.
    pub next: Option<UserSession>,
    pub action: Action,
}

impl Decision {
    fn reply(next: Option<UserSession>, text: impl Into<String>) -> Self {
        Self {
            next,
            action: Action::Reply(text.into()),
        }
    }
}

pub fn decide(session: Option<&UserSession>, event: &EventKind) -> Decision {
    match (ConversationState::of(session), event) {
        (ConversationState::New, _) => Decision::reply(
            Some(UserSession::awaiting(Language::BASE)),
            language_menu(),
        ),

        (ConversationState::AwaitingLanguage, EventKind::Text(text)) => match parse_selector(text)
        {
            Some(language) => {
                Decision::reply(Some(UserSession::active(language)), confirmation(language))
            }
            None => Decision::reply(None, language_menu()),
        },
        (ConversationState::AwaitingLanguage, EventKind::Image(_)) => {
            Decision::reply(None, language_menu())
        }

        (ConversationState::Active(language), EventKind::Text(text)) => {
            if let Some(selected) = parse_selector(text) {
                return Decision::reply(
                    Some(UserSession::active(selected)),
                    confirmation(selected),
                );
            }
            if is_change_language(text) {
                return Decision::reply(Some(UserSession::awaiting(language)), language_menu());
            }
            let strings = catalog(language);
            let reply = match classify(text) {
                Intent::Greeting => strings.welcome,
                Intent::Help => strings.help,
                Intent::Other => strings.fallback,
            };
            Decision::reply(None, reply)
        }
        (ConversationState::Active(language), EventKind::Image(media)) => Decision {
            next: None,
            action: Action::Analyze {
                media: media.clone(),
                language,
            },
        },
    }
}
