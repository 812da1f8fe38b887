//! Lenient serde helpers for usage exports, which arrive from spreadsheets
//! and database dumps with inconsistent cell types.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(u64),
    Float(f64),
    Text(String),
}

/// Accepts a string or a number; empty text becomes `None`.
pub fn opt_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Loose> = Option::deserialize(deserializer)?;
    Ok(match value {
        None => None,
        Some(Loose::Int(n)) => Some(n.to_string()),
        Some(Loose::Float(n)) => Some(n.to_string()),
        Some(Loose::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    })
}

/// Counts default to 0 when null or blank. "1 234" → 1234.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Loose> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(0),
        Some(Loose::Int(n)) => Ok(n),
        Some(Loose::Float(n)) if n.is_finite() && n >= 0.0 => Ok(n.round() as u64),
        Some(Loose::Float(n)) => Err(serde::de::Error::custom(format!(
            "invalid count: {n}"
        ))),
        Some(Loose::Text(s)) => {
            let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
            if cleaned.is_empty() {
                return Ok(0);
            }
            cleaned.parse::<u64>().map_err(serde::de::Error::custom)
        }
    }
}
