//! Catalog domain model.
//!
//! # Responsibility
//! - Define the stored records (contributor, tag, contribution, review).
//! - Define write payloads and their explicit normalization rules.
//!
//! # Invariants
//! - Write payloads are normalized before any integrity check or SQL write.
//! - Association membership lives in link tables, never on the records.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use url::Url;

pub mod contribution;
pub mod contributor;
pub mod review;
pub mod tag;

/// Validation failure for a write payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trimming.
    EmptyField(&'static str),
    /// Field must hold an absolute `http`/`https` URL.
    InvalidUrl { field: String, value: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} must not be empty"),
            Self::InvalidUrl { field, value } => {
                write!(f, "{field} is not a valid http(s) URL: `{value}`")
            }
        }
    }
}

impl Error for ValidationError {}

/// Maps an empty string to `None`, keeping every other value untouched.
pub fn empty_to_none(value: Option<String>) -> Option<String> {
    value.filter(|inner| !inner.is_empty())
}

/// Rejects blank required text fields.
pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

/// Parses and re-serializes one http(s) URL.
///
/// Serialization is the canonical `url` form, so `https://example.com`
/// becomes `https://example.com/`.
pub fn normalize_http_url(field: &str, value: &str) -> Result<String, ValidationError> {
    let invalid = || ValidationError::InvalidUrl {
        field: field.to_string(),
        value: value.to_string(),
    };
    let parsed = Url::parse(value.trim()).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }
    Ok(parsed.to_string())
}

/// Normalizes an optional URL field: empty → `None`, otherwise validated.
pub fn normalize_optional_url(
    field: &str,
    value: Option<String>,
) -> Result<Option<String>, ValidationError> {
    empty_to_none(value)
        .map(|inner| normalize_http_url(field, &inner))
        .transpose()
}

/// Parses the datetime forms accepted on write payloads.
///
/// | input | result |
/// |---|---|
/// | `2021-01-01T00:00:00` or `2021-01-01 00:00:00` | as given, fractions kept |
/// | `2021-01-01T00:00` | seconds zeroed |
/// | `2021-01-01T02:00:00+02:00`, `...Z` | converted to naive UTC |
/// | `2021-01-01` | midnight |
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    // Byte 10 is ASCII when it matches, so both slices land on char boundaries.
    let normalized = if value.as_bytes().get(10) == Some(&b' ') {
        format!("{}T{}", &value[..10], &value[11..])
    } else {
        value.to_string()
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(parsed.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub(crate) fn deserialize_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw).ok_or_else(|| de::Error::custom(format!("invalid datetime `{raw}`")))
}

pub(crate) fn deserialize_optional_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| {
            parse_datetime(&raw)
                .ok_or_else(|| de::Error::custom(format!("invalid datetime `{raw}`")))
        })
        .transpose()
}
