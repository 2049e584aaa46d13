// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook request signatures.
//!
//! Meta signs the raw body with HMAC-SHA256 and sends
//! `X-Hub-Signature-256: sha256=<hex>`. Twilio signs the public URL followed
//! by every form field (sorted by name, key then value) with HMAC-SHA1 and
//! sends the base64 digest in `X-Twilio-Signature`. Comparisons are constant
//! time.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

pub const META_HEADER: &str = "x-hub-signature-256";
pub const TWILIO_HEADER: &str = "x-twilio-signature";

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

/// Header value Meta would send for `body`.
pub fn meta_signature(app_secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length.
    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return String::new();
    };
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_meta(app_secret: &str, body: &[u8], header: Option<&str>) -> bool {
    let Some(hex_digest) = header.and_then(|h| h.trim().strip_prefix("sha256=")) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

fn twilio_mac(auth_token: &str, url: &str, params: &[(String, String)]) -> Option<HmacSha1> {
    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes()).ok()?;
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();
    mac.update(url.as_bytes());
    for (key, value) in sorted {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }
    Some(mac)
}

/// Header value Twilio would send for a post of `params` to `url`.
pub fn twilio_signature(auth_token: &str, url: &str, params: &[(String, String)]) -> String {
    twilio_mac(auth_token, url, params)
        .map(|mac| base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

pub fn verify_twilio(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    header: Option<&str>,
) -> bool {
    let Some(expected) = header
        .and_then(|h| base64::engine::general_purpose::STANDARD.decode(h.trim()).ok())
    else {
        return false;
    };
    twilio_mac(auth_token, url, params).is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}
