//! Shared helpers for decoding RAPI payloads.
//!
//! RAPI reports list-valued instance and node attributes under dotted keys such as
//! `nic.ips` or `disk.sizes`. Those keys are rewritten to underscore form before typed
//! decoding so they can map onto ordinary struct fields.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Rewrite the top-level keys of a JSON object, replacing `.` with `_`.
///
/// Non-object values are returned unchanged. Nested objects keep their keys.
#[must_use]
pub fn normalize_field_names(value: Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key.replace('.', "_"), value))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

/// Normalize field names, then decode into `T`.
///
/// # Errors
///
/// Returns [`Error::ParseError`] naming `what` if the value does not match `T`.
pub fn decode_normalized<T>(value: Value, what: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(normalize_field_names(value))
        .map_err(|err| Error::ParseError(format!("Failed to decode {what}: {err}")))
}

/// Convert a RAPI epoch timestamp (seconds, fractional) into a UTC datetime.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn epoch_to_datetime(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1_000_000_000.0).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}
