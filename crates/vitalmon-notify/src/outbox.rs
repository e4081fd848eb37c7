//! Queue between alert persistence and email delivery.
//!
//! [`NotificationOutbox::enqueue`] never waits: a full queue drops the job
//! with a warning. The [`OutboxWorker`] routes each queued alert and writes
//! one [`DeliveryRecord`] per job, whatever the outcome.

use crate::router::{NotificationRouter, RouteOutcome};
use crate::{DeliveryLog, PreferenceSource};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use vitalmon_common::types::{Alert, DeliveryRecord, DeliveryStatus};

/// Creates a bounded outbox and the worker that drains it.
pub fn channel(
    capacity: usize,
    router: NotificationRouter,
    prefs: Arc<dyn PreferenceSource>,
    log: Arc<dyn DeliveryLog>,
) -> (NotificationOutbox, OutboxWorker) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        NotificationOutbox { tx },
        OutboxWorker {
            rx,
            router,
            prefs,
            log,
        },
    )
}

#[derive(Clone)]
pub struct NotificationOutbox {
    tx: mpsc::Sender<Alert>,
}

impl NotificationOutbox {
    /// Queues a persisted alert for notification. Returns false if the job
    /// was dropped.
    pub fn enqueue(&self, alert: Alert) -> bool {
        match self.tx.try_send(alert) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(alert)) => {
                tracing::warn!(
                    subject_id = %alert.subject_id,
                    alert_id = %alert.id,
                    "Notification queue full, dropping job"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(alert)) => {
                tracing::warn!(
                    subject_id = %alert.subject_id,
                    alert_id = %alert.id,
                    "Notification worker stopped, dropping job"
                );
                false
            }
        }
    }
}

pub struct OutboxWorker {
    rx: mpsc::Receiver<Alert>,
    router: NotificationRouter,
    prefs: Arc<dyn PreferenceSource>,
    log: Arc<dyn DeliveryLog>,
}

impl OutboxWorker {
    /// Processes jobs until every [`NotificationOutbox`] handle is dropped.
    pub async fn run(mut self) {
        tracing::info!("Notification worker started");
        while let Some(alert) = self.rx.recv().await {
            self.process(&alert).await;
        }
        tracing::info!("Notification worker stopped");
    }

    /// Processes whatever is queued right now and returns the job count.
    pub async fn drain(&mut self) -> usize {
        let mut n = 0;
        while let Ok(alert) = self.rx.try_recv() {
            self.process(&alert).await;
            n += 1;
        }
        n
    }

    /// Routes one alert and records the outcome.
    pub async fn process(&self, alert: &Alert) -> DeliveryRecord {
        let outcome = match self.prefs.preferences(&alert.subject_id).await {
            Ok(prefs) => self.router.route(alert, &prefs).await,
            Err(e) => {
                tracing::error!(
                    subject_id = %alert.subject_id,
                    alert_id = %alert.id,
                    error = %e,
                    "Failed to load notification preferences"
                );
                RouteOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        let (status, detail, message_id) = match outcome {
            RouteOutcome::Dispatched { message_id } => {
                (DeliveryStatus::Dispatched, None, Some(message_id))
            }
            RouteOutcome::Skipped(reason) => {
                (DeliveryStatus::Skipped, Some(reason.to_string()), None)
            }
            RouteOutcome::Failed { error } => (DeliveryStatus::Failed, Some(error), None),
        };
        let record = DeliveryRecord {
            id: vitalmon_common::id::next_id(),
            alert_id: alert.id.clone(),
            subject_id: alert.subject_id.clone(),
            severity: alert.severity,
            status,
            detail,
            message_id,
            created_at: Utc::now(),
        };

        if let Err(e) = self.log.record(&record).await {
            tracing::error!(alert_id = %alert.id, error = %e, "Failed to write delivery record");
        }
        record
    }
}
