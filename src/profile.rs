//! Power profile documents as delivered by the meter.
//!
//! One `getPowerProfile.html` response carries a `<header>` block with the
//! unix timestamp of the first sample and a flat run of `<v>` elements, one
//! integer wattage per second. [`PowerProfile`] keeps the values together
//! with the timestamp of the *last* value; the start is derived, which keeps
//! batches end-anchored the way the device hands them out.

use chrono::{DateTime, Duration, TimeZone, Utc};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::history::SAMPLE_RATE_SECS;

/// Errors raised while parsing a profile document.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The document has no `<header>` element
    #[error("missing <header> element in profile document")]
    MissingHeader,

    /// The header has no usable `<startts>` timestamp
    #[error("missing or invalid <startts> in profile header")]
    MissingStartTimestamp,
}

/// A contiguous run of wattage values fetched in one request.
///
/// `endts` is the timestamp of the last value; `startts` follows from the
/// length at one sample per second.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PowerProfile {
    /// Wattage values in timeline order, one per second
    pub values: Vec<i32>,
    /// Timestamp of the last value
    pub endts: DateTime<Utc>,
}

impl PowerProfile {
    /// Create a profile anchored at its last value.
    pub fn new(values: Vec<i32>, endts: DateTime<Utc>) -> Self {
        Self { values, endts }
    }

    /// Create a profile anchored at its first value.
    pub fn from_start(startts: DateTime<Utc>, values: Vec<i32>) -> Self {
        let endts =
            startts + Duration::seconds((values.len() as i64 - 1) * SAMPLE_RATE_SECS);
        Self { values, endts }
    }

    /// Timestamp of the first value, derived from `endts` and the length.
    pub fn startts(&self) -> DateTime<Utc> {
        self.endts - Duration::seconds((self.values.len() as i64 - 1) * SAMPLE_RATE_SECS)
    }

    /// Parse a profile XML document.
    ///
    /// The grammar is flat, so the fields are extracted with targeted
    /// patterns instead of a full XML parse: `<startts>` is read from inside
    /// the `<header>` block, every `<v>` outside it contributes one value.
    /// Unparseable `<v>` elements are skipped with a warning; a missing
    /// header or start timestamp fails the whole document.
    pub fn parse(document: &str) -> Result<Self, ProfileError> {
        let header_regex =
            Regex::new(r"(?s)<header>(.*?)</header>").expect("Failed to compile regex");
        let startts_regex =
            Regex::new(r"<startts>\s*(\d+)\s*</startts>").expect("Failed to compile regex");
        let value_regex =
            Regex::new(r"<v>\s*([^<]*?)\s*</v>").expect("Failed to compile regex");

        let header = header_regex
            .captures(document)
            .ok_or(ProfileError::MissingHeader)?;
        let startts_secs: i64 = startts_regex
            .captures(&header[1])
            .and_then(|c| c[1].parse().ok())
            .ok_or(ProfileError::MissingStartTimestamp)?;
        let startts = Utc
            .timestamp_opt(startts_secs, 0)
            .single()
            .ok_or(ProfileError::MissingStartTimestamp)?;

        // values live outside the header; cut the header block before scanning
        let body = header_regex.replace(document, "");
        let values: Vec<i32> = value_regex
            .captures_iter(&body)
            .filter_map(|c| {
                let raw = &c[1];
                match raw.parse() {
                    Ok(v) => Some(v),
                    Err(_) => {
                        tracing::warn!(value = raw, "skipping unparseable <v> element");
                        None
                    }
                }
            })
            .collect();

        Ok(Self::from_start(startts, values))
    }
}
