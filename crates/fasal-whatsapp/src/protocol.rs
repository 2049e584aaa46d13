// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Wire protocol of a webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Meta Cloud API: JSON push, reply sent out-of-band.
    PushJson,
    /// Twilio: form post, reply returned as TwiML.
    FormPost,
}

impl Protocol {
    /// Form-encoded bodies are Twilio; everything else is treated as Meta JSON.
    pub fn detect(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.to_ascii_lowercase().contains("application/x-www-form-urlencoded") => {
                Protocol::FormPost
            }
            _ => Protocol::PushJson,
        }
    }

    pub fn provider(self) -> &'static str {
        match self {
            Protocol::PushJson => "meta",
            Protocol::FormPost => "twilio",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_content_type() {
        assert_eq!(
            Protocol::detect(Some("application/x-www-form-urlencoded; charset=utf-8")),
            Protocol::FormPost
        );
        assert_eq!(
            Protocol::detect(Some("Application/X-WWW-Form-Urlencoded")),
            Protocol::FormPost
        );
        assert_eq!(Protocol::detect(Some("application/json")), Protocol::PushJson);
        assert_eq!(Protocol::detect(Some("text/plain")), Protocol::PushJson);
        assert_eq!(Protocol::detect(None), Protocol::PushJson);
    }
}
