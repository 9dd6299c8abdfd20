//! Common test utilities shared across all test modules
//!
//! Helpers for building timestamps, mock power profiles, and profile XML
//! documents the way the meter emits them.

use chrono::{DateTime, TimeZone, Utc};
use wattview::profile::PowerProfile;

/// Unix-second timestamp shorthand.
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// A profile anchored at its first sample, like the original test mocks.
pub fn mock_profile(start_secs: i64, values: &[i32]) -> PowerProfile {
    PowerProfile::from_start(ts(start_secs), values.to_vec())
}

/// Render a profile XML document as the meter would serve it.
pub fn profile_document(startts: i64, values: &[i32]) -> String {
    let mut doc = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<pollresp>\n");
    doc.push_str("  <header>\n    <pollid>1</pollid>\n");
    doc.push_str(&format!("    <startts>{}</startts>\n", startts));
    doc.push_str("  </header>\n");
    for v in values {
        doc.push_str(&format!("  <v>{}</v>\n", v));
    }
    doc.push_str("</pollresp>\n");
    doc
}
