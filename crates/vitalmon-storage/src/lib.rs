//! Persistence for readings, alerts, notification preferences and
//! delivery logs, plus the alert submission gate.
//!
//! [`store::HealthStore`] wraps a SeaORM connection (SQLite by default) and
//! runs the `migration` crate on startup. [`gate::SubmissionGate`] is the
//! only writer of alerts: it fingerprints each candidate, applies the
//! time-window rate limits and serializes submissions per subject.

pub mod entities;
pub mod error;
pub mod gate;
pub mod store;


use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vitalmon_common::types::{Alert, Severity};

pub use error::{Result, StorageError};
pub use gate::{DedupPolicy, SubmissionGate, SubmitOutcome, SuppressReason};
pub use store::{AlertFilter, HealthStore};

/// The alert queries and insert the submission gate depends on.
///
/// Implementations must report a unique-constraint violation on the
/// fingerprint as [`StorageError::DuplicateFingerprint`] so concurrent
/// losers can be treated as suppressed.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Alert>>;

    /// The most recent alert for the subject with this severity created
    /// strictly after `since`.
    async fn latest_with_severity_since(
        &self,
        subject_id: &str,
        severity: Severity,
        since: DateTime<Utc>,
    ) -> Result<Option<Alert>>;

    /// The most recent alert for the subject with this exact title created
    /// strictly after `since`.
    async fn latest_with_title_since(
        &self,
        subject_id: &str,
        title: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Alert>>;

    async fn insert(&self, alert: &Alert) -> Result<Alert>;
}
