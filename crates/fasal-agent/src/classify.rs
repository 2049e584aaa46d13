// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword classification of free text from an active user.

/// Commands that reopen the language menu. Matched against the whole message.
const CHANGE_LANGUAGE: &[&str] = &["lang", "language", "भाषा", "bhasha", "change language"];

const GREETINGS: &[&str] = &[
    "hi", "hello", "hey", "hii", "namaste", "नमस्ते", "namaskar", "नमस्कार", "vanakkam",
    "வணக்கம்", "start",
];

const HELP: &[&str] = &["help", "madad", "मदद", "sahayata", "सहायता", "உதவி", "సహాయం"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Help,
    Other,
}

/// True when the whole message asks to change language.
pub fn is_change_language(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    CHANGE_LANGUAGE.contains(&text.as_str())
}

/// Classifies by whole-word keyword match. Help wins over greeting.
pub fn classify(text: &str) -> Intent {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation() || c == '।')
        .filter(|w| !w.is_empty())
        .collect();

    if words.iter().any(|w| HELP.contains(w)) {
        Intent::Help
    } else if words.iter().any(|w| GREETINGS.contains(w)) {
        Intent::Greeting
    } else {
        Intent::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_language_needs_the_whole_message() {
        assert!(is_change_language("lang"));
        assert!(is_change_language("  LANGUAGE "));
        assert!(is_change_language("भाषा"));
        assert!(is_change_language("Bhasha"));
        assert!(!is_change_language("what language is this"));
        assert!(!is_change_language("langoor"));
    }

    #[test]
    fn keywords_match_whole_words_only() {
        assert_eq!(classify("Hi!"), Intent::Greeting);
        assert_eq!(classify("नमस्ते भाई"), Intent::Greeting);
        assert_eq!(classify("I need help, please"), Intent::Help);
        assert_eq!(classify("hello, help me"), Intent::Help);
        assert_eq!(classify("which fertilizer is best"), Intent::Other);
        assert_eq!(classify("this is hindi"), Intent::Other);
        assert_eq!(classify("helpful tips"), Intent::Other);
        assert_eq!(classify(""), Intent::Other);
    }
}
