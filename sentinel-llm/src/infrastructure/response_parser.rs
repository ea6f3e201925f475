//! JSON extraction from model output
//!
//! Backends are instructed to reply with bare JSON but routinely wrap it in
//! markdown fences or narrative text. Extraction tries progressively looser
//! strategies before giving up.

use serde::de::DeserializeOwned;

use crate::domain::InferenceError;

/// Parse a typed JSON value out of raw model output.
///
/// Strategy order: the full trimmed text, a ```json fence, any fence, then
/// the first valid JSON object or array embedded in the text.
pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T, InferenceError> {
    let trimmed = content.trim();
    if let Ok(parsed) = serde_json::from_str::<T>(trimmed) {
        return Ok(parsed);
    }

    for candidate in [
        fenced_block(trimmed, Some("json")),
        fenced_block(trimmed, None),
        first_json_value(trimmed),
    ]
    .into_iter()
    .flatten()
    {
        if let Ok(parsed) = serde_json::from_str::<T>(&candidate) {
            return Ok(parsed);
        }
    }

    Err(InferenceError::InvalidResponse(
        "no parseable JSON in model output".to_string(),
    ))
}

/// Body of the first fenced code block, optionally requiring a language tag
fn fenced_block(content: &str, language: Option<&str>) -> Option<String> {
    let fence = "```";
    let mut search = content;

    loop {
        let start = search.find(fence)?;
        let after_open = &search[start + fence.len()..];
        let line_end = after_open.find('\n')?;
        let tag = after_open[..line_end].trim();
        let body = &after_open[line_end + 1..];

        if let Some(expected) = language {
            if !tag.eq_ignore_ascii_case(expected) {
                search = after_open;
                continue;
            }
        }

        let end = body.find(fence)?;
        return Some(body[..end].trim().to_string());
    }
}

/// First complete JSON object or array embedded anywhere in the text.
/// Uses the streaming deserializer to find a valid prefix.
fn first_json_value(content: &str) -> Option<String> {
    for (idx, ch) in content.char_indices() {
        if ch == '{' || ch == '[' {
            let candidate = &content[idx..];
            let mut stream =
                serde_json::Deserializer::from_str(candidate).into_iter::<serde_json::Value>();
            if let Some(Ok(_)) = stream.next() {
                let end = stream.byte_offset();
                if end > 0 && end <= candidate.len() {
                    return Some(candidate[..end].to_string());
                }
            }
        }
    }
    None
}
