//! Content fingerprints that reject exact-duplicate alert submissions.
//!
//! The digest covers the subject, severity, title, message and the
//! observation time rounded down to the minute. A version byte is hashed
//! first, so changing the recipe means bumping [`FINGERPRINT_VERSION`]
//! rather than silently producing digests that no longer match stored rows.

use crate::types::{AlertCandidate, Severity};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

pub const FINGERPRINT_VERSION: u8 = 1;

const FIELD_SEPARATOR: u8 = 0x1f;

/// Computes the fingerprint for an alert.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use vitalmon_common::fingerprint::fingerprint;
/// use vitalmon_common::types::Severity;
///
/// let a = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 5).unwrap();
/// let b = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 59).unwrap();
/// assert_eq!(
///     fingerprint("p-1", Severity::Critical, "High Heart Rate", "125 bpm", a),
///     fingerprint("p-1", Severity::Critical, "High Heart Rate", "125 bpm", b),
/// );
/// ```
pub fn fingerprint(
    subject_id: &str,
    severity: Severity,
    title: &str,
    message: &str,
    observed_at: DateTime<Utc>,
) -> String {
    let minute = observed_at.timestamp().div_euclid(60);

    let mut hasher = Sha256::new();
    hasher.update([FINGERPRINT_VERSION]);
    for field in [subject_id, severity.as_str(), title, message] {
        hasher.update(field.as_bytes());
        hasher.update([FIELD_SEPARATOR]);
    }
    hasher.update(minute.to_be_bytes());

    format!("v{FINGERPRINT_VERSION}:{}", hex::encode(hasher.finalize()))
}

pub fn candidate_fingerprint(subject_id: &str, candidate: &AlertCandidate) -> String {
    fingerprint(
        subject_id,
        candidate.severity,
        &candidate.title,
        &candidate.message,
        candidate.observed_at,
    )
}
