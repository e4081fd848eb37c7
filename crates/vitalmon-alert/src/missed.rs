use chrono::{DateTime, Utc};
use std::collections::HashSet;
use vitalmon_common::types::{AlertCandidate, AlertSource, ReadingKind, Severity, CORE_READING_KINDS};

/// Reminds a subject about core readings absent from the trailing day.
#[derive(Default)]
pub struct MissedReadingDetector;

impl MissedReadingDetector {
    /// One info candidate per core kind missing from `logged`.
    pub fn detect(&self, logged: &HashSet<ReadingKind>, now: DateTime<Utc>) -> Vec<AlertCandidate> {
        CORE_READING_KINDS
            .iter()
            .filter(|kind| !logged.contains(*kind))
            .map(|kind| {
                AlertCandidate::new(
                    Severity::Info,
                    AlertSource::MissedReading,
                    format!("Missed Reading Reminder: {}", kind.label()),
                    format!(
                        "You haven't logged your {} in the last 24 hours. Regular readings help your care team spot changes early.",
                        kind.label().to_lowercase()
                    ),
                    now,
                )
                .with_kind(kind.clone())
            })
            .collect()
    }
}
