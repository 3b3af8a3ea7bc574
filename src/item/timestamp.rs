//! Date inputs for request bodies.
//!
//! Besides RFC 3339, bodies may carry the values HTML date controls produce:
//! `2024-05-03` from a date picker and `2024-05-03T17:00` from a
//! `datetime-local` input. Values without an offset are read as UTC, a bare
//! date as midnight UTC. A cleared input arrives as `""` and means "no value".

use serde::{de, Deserialize, Deserializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Parse a date input. Blank input yields `Ok(None)`.
pub fn parse(raw: &str) -> Result<Option<OffsetDateTime>, time::error::Parse> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let rfc3339 = match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(ts) => return Ok(Some(ts)),
        Err(e) => e,
    };

    let with_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    if let Ok(local) = PrimitiveDateTime::parse(raw, with_seconds) {
        return Ok(Some(local.assume_utc()));
    }

    let minutes = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    if let Ok(local) = PrimitiveDateTime::parse(raw, minutes) {
        return Ok(Some(local.assume_utc()));
    }

    if let Ok(date) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Ok(Some(date.midnight().assume_utc()));
    }

    Err(rfc3339)
}

/// Optional date field: absent, `null` and `""` all become `None`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse(&raw)
            .map_err(|e| de::Error::custom(format!("invalid date {:?}: {}", raw, e))),
    }
}

/// Patch date field: a present `null` or `""` becomes `Some(None)`, an absent
/// field stays `None` through `#[serde(default)]`.
pub fn deserialize_nullable<'de, D>(
    deserializer: D,
) -> Result<Option<Option<OffsetDateTime>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize(deserializer).map(Some)
}
