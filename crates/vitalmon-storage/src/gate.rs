use crate::error::{Result, StorageError};
use crate::AlertStore;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use vitalmon_common::fingerprint::candidate_fingerprint;
use vitalmon_common::types::{Alert, AlertCandidate, AlertSource};

/// Time windows used by [`SubmissionGate`].
#[derive(Debug, Clone, Copy)]
pub struct DedupPolicy {
    /// Window for the `(subject, severity)` rate limit.
    pub severity_window: Duration,
    /// Window for the identical-title rule on positive-reinforcement
    /// candidates.
    pub title_window: Duration,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self {
            severity_window: Duration::hours(6),
            title_window: Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    DuplicateFingerprint,
    SeverityWindow,
    TitleWindow,
}

impl SuppressReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressReason::DuplicateFingerprint => "duplicate_fingerprint",
            SuppressReason::SeverityWindow => "severity_window",
            SuppressReason::TitleWindow => "title_window",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Persisted(Alert),
    Suppressed(SuppressReason),
}

impl SubmitOutcome {
    pub fn persisted(&self) -> Option<&Alert> {
        match self {
            SubmitOutcome::Persisted(alert) => Some(alert),
            SubmitOutcome::Suppressed(_) => None,
        }
    }
}

type SubjectLock = Arc<Mutex<()>>;

/// The single writer of alerts.
///
/// Each candidate is checked against the fingerprint index, then the
/// `(subject, severity)` window and, for positive reinforcement, the title
/// window. Submissions for one subject are serialized so two candidates
/// of the same pass cannot both pass a window check before either is
/// inserted. Different subjects never contend.
pub struct SubmissionGate {
    store: Arc<dyn AlertStore>,
    policy: DedupPolicy,
    locks: Mutex<HashMap<String, SubjectLock>>,
}

impl SubmissionGate {
    pub fn new(store: Arc<dyn AlertStore>, policy: DedupPolicy) -> Self {
        Self {
            store,
            policy,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn submit(
        &self,
        subject_id: &str,
        candidate: &AlertCandidate,
    ) -> Result<SubmitOutcome> {
        self.submit_at(subject_id, candidate, Utc::now()).await
    }

    /// Submits one candidate as if the current time were `now`.
    pub async fn submit_at(
        &self,
        subject_id: &str,
        candidate: &AlertCandidate,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome> {
        let lock = self.subject_lock(subject_id).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.submit_locked(subject_id, candidate, now).await
        };
        drop(lock);
        self.release_subject_lock(subject_id).await;
        outcome
    }

    /// Submits a pass's candidates in order under one subject lock.
    ///
    /// Stops at the first persistence error; alerts inserted before it stay.
    pub async fn submit_all(
        &self,
        subject_id: &str,
        candidates: &[AlertCandidate],
        now: DateTime<Utc>,
    ) -> Result<Vec<SubmitOutcome>> {
        let lock = self.subject_lock(subject_id).await;
        let outcomes = {
            let _guard = lock.lock().await;
            let mut outcomes = Vec::with_capacity(candidates.len());
            let mut failed = None;
            for candidate in candidates {
                match self.submit_locked(subject_id, candidate, now).await {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => {
                        failed = Some(e);
                        break;
                    }
                }
            }
            match failed {
                Some(e) => Err(e),
                None => Ok(outcomes),
            }
        };
        drop(lock);
        self.release_subject_lock(subject_id).await;
        outcomes
    }

    async fn submit_locked(
        &self,
        subject_id: &str,
        candidate: &AlertCandidate,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome> {
        let fingerprint = candidate_fingerprint(subject_id, candidate);

        if self.store.find_by_fingerprint(&fingerprint).await?.is_some() {
            return Ok(self.suppress(subject_id, candidate, SuppressReason::DuplicateFingerprint));
        }

        let since = now - self.policy.severity_window;
        if self
            .store
            .latest_with_severity_since(subject_id, candidate.severity, since)
            .await?
            .is_some()
        {
            return Ok(self.suppress(subject_id, candidate, SuppressReason::SeverityWindow));
        }

        if candidate.source == AlertSource::PositiveReinforcement {
            let since = now - self.policy.title_window;
            if self
                .store
                .latest_with_title_since(subject_id, &candidate.title, since)
                .await?
                .is_some()
            {
                return Ok(self.suppress(subject_id, candidate, SuppressReason::TitleWindow));
            }
        }

        let alert = Alert {
            id: vitalmon_common::id::next_id(),
            subject_id: subject_id.to_string(),
            severity: candidate.severity,
            title: candidate.title.clone(),
            message: candidate.message.clone(),
            source: candidate.source,
            related_kind: candidate.related_kind.clone(),
            observed_at: candidate.observed_at,
            created_at: now,
            is_read: false,
            fingerprint: Some(fingerprint),
        };

        match self.store.insert(&alert).await {
            Ok(saved) => {
                tracing::info!(
                    subject_id,
                    alert_id = %saved.id,
                    severity = %saved.severity,
                    title = %saved.title,
                    "Alert persisted"
                );
                Ok(SubmitOutcome::Persisted(saved))
            }
            Err(StorageError::DuplicateFingerprint) => {
                Ok(self.suppress(subject_id, candidate, SuppressReason::DuplicateFingerprint))
            }
            Err(e) => {
                tracing::error!(subject_id, error = %e, "Failed to persist alert");
                Err(e)
            }
        }
    }

    fn suppress(
        &self,
        subject_id: &str,
        candidate: &AlertCandidate,
        reason: SuppressReason,
    ) -> SubmitOutcome {
        tracing::debug!(
            subject_id,
            severity = %candidate.severity,
            title = %candidate.title,
            reason = reason.as_str(),
            "Alert suppressed"
        );
        SubmitOutcome::Suppressed(reason)
    }

    async fn subject_lock(&self, subject_id: &str) -> SubjectLock {
        let mut locks = self.locks.lock().await;
        locks
            .entry(subject_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the subject's lock entry once no submission holds a handle.
    async fn release_subject_lock(&self, subject_id: &str) {
        let mut locks = self.locks.lock().await;
        if locks
            .get(subject_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(subject_id);
        }
    }

    #[cfg(test)]
    pub(crate) async fn tracked_subjects(&self) -> usize {
        self.locks.lock().await.len()
    }
}
