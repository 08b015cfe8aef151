use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Chemical;

/// Errors raised while constructing readings
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadingError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// The four measurement fields; any of them may be absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chlorine: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alkalinity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl Measurements {
    /// All four fields present
    pub fn new(chlorine: f64, ph: f64, alkalinity: f64, temperature: f64) -> Self {
        Self {
            chlorine: Some(chlorine),
            ph: Some(ph),
            alkalinity: Some(alkalinity),
            temperature: Some(temperature),
        }
    }

    pub fn get(&self, chemical: Chemical) -> Option<f64> {
        match chemical {
            Chemical::Chlorine => self.chlorine,
            Chemical::Ph => self.ph,
            Chemical::Alkalinity => self.alkalinity,
            Chemical::Temperature => self.temperature,
        }
    }

    pub fn set(&mut self, chemical: Chemical, value: Option<f64>) {
        let slot = match chemical {
            Chemical::Chlorine => &mut self.chlorine,
            Chemical::Ph => &mut self.ph,
            Chemical::Alkalinity => &mut self.alkalinity,
            Chemical::Temperature => &mut self.temperature,
        };
        *slot = value;
    }

    /// Present fields in fixed field order
    pub fn present(&self) -> impl Iterator<Item = (Chemical, f64)> + '_ {
        Chemical::ALL
            .into_iter()
            .filter_map(|chemical| self.get(chemical).map(|value| (chemical, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }
}

/// One water-quality measurement event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalReading {
    /// Assigned at construction and never changed afterwards
    id: String,

    #[serde(with = "iso_timestamp")]
    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub measurements: Measurements,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ChemicalReading {
    pub fn new(timestamp: DateTime<Utc>, measurements: Measurements) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            timestamp,
            measurements,
            notes: None,
        }
    }

    /// Build a reading from an ISO-8601 timestamp string
    pub fn from_iso(timestamp: &str, measurements: Measurements) -> Result<Self, ReadingError> {
        Ok(Self::new(parse_timestamp(timestamp)?, measurements))
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        self.notes = if notes.trim().is_empty() { None } else { Some(notes) };
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value(&self, chemical: Chemical) -> Option<f64> {
        self.measurements.get(chemical)
    }
}

/// Parse the timestamp spellings accepted from forms and imports.
///
/// Accepts RFC 3339 with any offset, a naive `YYYY-MM-DDTHH:MM:SS[.fff]`
/// (or space-separated) taken as UTC, and a bare `YYYY-MM-DD` at midnight UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, ReadingError> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(ReadingError::InvalidTimestamp(trimmed.to_string()))
}

/// ISO-8601 with millisecond precision and a `Z` suffix
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod iso_timestamp {
    use super::*;
    use serde::{Deserializer, Serializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        Millis(i64),
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Text(text) => parse_timestamp(&text).map_err(D::Error::custom),
            RawTimestamp::Millis(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", ms))),
        }
    }
}
