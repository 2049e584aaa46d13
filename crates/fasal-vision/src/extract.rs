// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recovery of a JSON object from free-form model output.
//!
//! Models asked for "JSON only" still wrap it in code fences or prose. The
//! extractor strips fences, tries the whole text, then falls back to the
//! first balanced `{...}` span that parses as an object.

use serde_json::Value;

/// Returns the first JSON object found in `text`.
pub fn extract_json(text: &str) -> Option<Value> {
    let unfenced = strip_code_fence(text);
    if let Ok(value @ Value::Object(_)) = serde_json::from_str(unfenced.trim()) {
        return Some(value);
    }

    let mut from = 0;
    while let Some(offset) = text[from..].find('{') {
        let start = from + offset;
        if let Some(end) = balanced_end(&text[start..]) {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str(&text[start..start + end]) {
                return Some(value);
            }
        }
        from = start + 1;
    }
    None
}

/// Contents of the first fenced block, or `text` unchanged.
fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let body = &text[open + 3..];
    // Skip the info string (`json`) up to the end of the fence line.
    let body = match body.find('\n') {
        Some(nl) if !body[..nl].contains('{') => &body[nl + 1..],
        _ => body.trim_start_matches("json"),
    };
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

/// Byte length of the balanced object starting at `text[0] == '{'`,
/// ignoring braces inside string literals.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
