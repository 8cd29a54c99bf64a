//! Shareable data token: URL-safe base64 over the JSON score table.

use crate::game::score_table::{DataError, ScoreTable};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

pub fn encode(table: &ScoreTable) -> Result<String, DataError> {
    let json = serde_json::to_string(table)?;
    Ok(URL_SAFE_NO_PAD.encode(json.as_bytes()))
}

/// Decodes and validates a token. Accepts either base64 alphabet, stray padding,
/// and `+` that a query decoder turned into a space.
pub fn decode(token: &str) -> Result<ScoreTable, DataError> {
    let normalized = normalize_token(token);
    let bytes = URL_SAFE_NO_PAD.decode(normalized.as_bytes())?;
    let json = String::from_utf8(bytes)?;
    let table: ScoreTable = serde_json::from_str(&json)?;
    table.validate()?;
    Ok(table)
}

fn normalize_token(token: &str) -> String {
    token
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' | ' ' => '-',
            '/' => '_',
            other => other,
        })
        .collect()
}
