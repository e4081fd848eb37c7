use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use vitalmon_alert::engine::EvaluationEngine;
use vitalmon_alert::history::ReadingHistory;
use vitalmon_common::types::{AlertCandidate, Reading};
use vitalmon_notify::outbox::NotificationOutbox;
use vitalmon_storage::{HealthStore, SubmissionGate, SubmitOutcome};

/// Counts for one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub subject_id: String,
    pub candidates: usize,
    pub persisted: usize,
    pub suppressed: usize,
    /// Persisted alerts the notification queue had no room for.
    pub notify_dropped: usize,
}

/// Runs the generators for a subject, submits the candidates through the
/// gate and queues every persisted alert for notification.
pub struct AlertPipeline {
    store: Arc<HealthStore>,
    engine: EvaluationEngine,
    gate: SubmissionGate,
    outbox: NotificationOutbox,
    full_pass_on_ingest: bool,
}

impl AlertPipeline {
    pub fn new(
        store: Arc<HealthStore>,
        engine: EvaluationEngine,
        gate: SubmissionGate,
        outbox: NotificationOutbox,
        full_pass_on_ingest: bool,
    ) -> Self {
        Self {
            store,
            engine,
            gate,
            outbox,
            full_pass_on_ingest,
        }
    }

    pub fn store(&self) -> &Arc<HealthStore> {
        &self.store
    }

    /// Called by ingestion after `reading` has been stored.
    pub async fn on_reading_persisted(&self, reading: &Reading) -> Result<PassReport> {
        self.on_reading_persisted_at(reading, Utc::now()).await
    }

    /// Threshold check for the new reading, followed by a full history pass
    /// when enabled.
    pub async fn on_reading_persisted_at(
        &self,
        reading: &Reading,
        now: DateTime<Utc>,
    ) -> Result<PassReport> {
        let mut candidates = self.engine.evaluate_reading(reading);
        if self.full_pass_on_ingest {
            let history = self.load_history(&reading.subject_id, now).await?;
            let more = self.engine.evaluate_history(&history, &candidates);
            candidates.extend(more);
        }
        self.submit(&reading.subject_id, candidates, now).await
    }

    /// Full pass over a subject's recent history.
    ///
    /// Threshold alerts belong to the ingest path. Here the last day's
    /// readings are only re-checked to hold back positive reinforcement
    /// while any of them is out of range; they are never submitted again.
    pub async fn evaluate_subject(
        &self,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<PassReport> {
        let history = self.load_history(subject_id, now).await?;
        let out_of_range: Vec<AlertCandidate> = history
            .within(self.engine.daily_window)
            .flat_map(|r| self.engine.evaluate_reading(r))
            .collect();
        let candidates = self.engine.evaluate_history(&history, &out_of_range);
        self.submit(subject_id, candidates, now).await
    }

    async fn load_history(
        &self,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ReadingHistory> {
        let since = now - self.engine.lookback();
        let readings = self
            .store
            .readings_since(subject_id, since)
            .await
            .with_context(|| format!("Failed to load readings for subject {subject_id}"))?;
        Ok(ReadingHistory::new(readings, now))
    }

    async fn submit(
        &self,
        subject_id: &str,
        candidates: Vec<AlertCandidate>,
        now: DateTime<Utc>,
    ) -> Result<PassReport> {
        let mut report = PassReport {
            subject_id: subject_id.to_string(),
            candidates: candidates.len(),
            ..Default::default()
        };
        if candidates.is_empty() {
            return Ok(report);
        }

        let outcomes = self
            .gate
            .submit_all(subject_id, &candidates, now)
            .await
            .with_context(|| format!("Failed to submit alerts for subject {subject_id}"))?;

        for outcome in outcomes {
            match outcome {
                SubmitOutcome::Persisted(alert) => {
                    report.persisted += 1;
                    if !self.outbox.enqueue(alert) {
                        report.notify_dropped += 1;
                    }
                }
                SubmitOutcome::Suppressed(_) => report.suppressed += 1,
            }
        }

        tracing::info!(
            subject_id,
            candidates = report.candidates,
            persisted = report.persisted,
            suppressed = report.suppressed,
            "Evaluation pass finished"
        );
        Ok(report)
    }
}
