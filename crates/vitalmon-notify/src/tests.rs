use crate::error::{NotifyError, Result};
use crate::outbox;
use crate::router::{Decision, NotificationRouter, RouteOutcome, SkipReason};
use crate::{DeliveryLog, DeliveryReceipt, EmailMessage, EmailTransport, PreferenceSource};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use vitalmon_common::types::{
    Alert, AlertSource, DeliveryRecord, DeliveryStatus, NotificationPreferences, ReadingKind,
    Severity,
};

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(DeliveryReceipt {
            message_id: format!("<{}@test>", sent.len()),
        })
    }

    fn transport_name(&self) -> &str {
        "recording"
    }
}

struct FailingTransport;

#[async_trait]
impl EmailTransport for FailingTransport {
    async fn send(&self, _message: &EmailMessage) -> Result<DeliveryReceipt> {
        Err(NotifyError::Smtp("connection refused".into()))
    }

    fn transport_name(&self) -> &str {
        "failing"
    }
}

#[derive(Default)]
struct MemoryPreferences {
    by_subject: Mutex<HashMap<String, NotificationPreferences>>,
}

impl MemoryPreferences {
    fn with(subject_id: &str, prefs: NotificationPreferences) -> Self {
        let me = Self::default();
        me.by_subject
            .lock()
            .unwrap()
            .insert(subject_id.to_string(), prefs);
        me
    }
}

#[async_trait]
impl PreferenceSource for MemoryPreferences {
    async fn preferences(&self, subject_id: &str) -> Result<NotificationPreferences> {
        Ok(self
            .by_subject
            .lock()
            .unwrap()
            .get(subject_id)
            .cloned()
            .unwrap_or_default())
    }
}

struct UnavailablePreferences;

#[async_trait]
impl PreferenceSource for UnavailablePreferences {
    async fn preferences(&self, _subject_id: &str) -> Result<NotificationPreferences> {
        Err(NotifyError::Preferences("database is locked".into()))
    }
}

#[derive(Default)]
struct MemoryLog {
    records: Mutex<Vec<DeliveryRecord>>,
}

#[async_trait]
impl DeliveryLog for MemoryLog {
    async fn record(&self, record: &DeliveryRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

fn alert(severity: Severity) -> Alert {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Alert {
        id: format!("a-{}", severity.as_str()),
        subject_id: "p-1".into(),
        severity,
        title: "High Heart Rate".into(),
        message: "Heart rate of 125 bpm is above 120 bpm.".into(),
        source: AlertSource::Threshold,
        related_kind: Some(ReadingKind::HeartRate),
        observed_at: at,
        created_at: at,
        is_read: false,
        fingerprint: None,
    }
}

fn reachable() -> NotificationPreferences {
    NotificationPreferences {
        email_address: Some("pat@example.com".into()),
        ..Default::default()
    }
}

#[test]
fn disabled_notifications_skip_every_severity() {
    let mut prefs = reachable();
    prefs.email_notifications = false;
    for sev in [Severity::Critical, Severity::Warning, Severity::Info] {
        assert_eq!(
            NotificationRouter::decide(&alert(sev), &prefs),
            Decision::Skip(SkipReason::NotificationsDisabled)
        );
    }

    let mut prefs = reachable();
    prefs.health_alerts = false;
    assert_eq!(
        NotificationRouter::decide(&alert(Severity::Critical), &prefs),
        Decision::Skip(SkipReason::NotificationsDisabled)
    );
}

#[test]
fn default_toggles_mute_info_only() {
    let prefs = reachable();
    assert_eq!(
        NotificationRouter::decide(&alert(Severity::Info), &prefs),
        Decision::Skip(SkipReason::SeverityOptedOut)
    );
    assert_eq!(
        NotificationRouter::decide(&alert(Severity::Warning), &prefs),
        Decision::Send {
            to: "pat@example.com"
        }
    );
}

#[test]
fn missing_or_blank_address_is_no_recipient() {
    let mut prefs = reachable();
    prefs.email_address = None;
    assert_eq!(
        NotificationRouter::decide(&alert(Severity::Critical), &prefs),
        Decision::Skip(SkipReason::NoRecipient)
    );
    prefs.email_address = Some("   ".into());
    assert_eq!(
        NotificationRouter::decide(&alert(Severity::Critical), &prefs),
        Decision::Skip(SkipReason::NoRecipient)
    );
}

#[tokio::test]
async fn critical_alert_is_dispatched_with_severity_template() {
    let transport = Arc::new(RecordingTransport::default());
    let router = NotificationRouter::new(transport.clone());

    let outcome = router.route(&alert(Severity::Critical), &reachable()).await;

    assert_eq!(
        outcome,
        RouteOutcome::Dispatched {
            message_id: "<1@test>".into()
        }
    );
    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "pat@example.com");
    assert_eq!(sent[0].subject, "[Critical] High Heart Rate");
    assert!(sent[0].html_body.contains("125 bpm"));
}

#[tokio::test]
async fn transport_failure_is_caught() {
    let router = NotificationRouter::new(Arc::new(FailingTransport));

    let outcome = router.route(&alert(Severity::Critical), &reachable()).await;

    match outcome {
        RouteOutcome::Failed { error } => assert!(error.contains("connection refused")),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn skipped_alert_never_reaches_transport() {
    let transport = Arc::new(RecordingTransport::default());
    let router = NotificationRouter::new(transport.clone());

    let outcome = router.route(&alert(Severity::Info), &reachable()).await;

    assert_eq!(outcome, RouteOutcome::Skipped(SkipReason::SeverityOptedOut));
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn outbox_records_every_outcome() {
    let transport = Arc::new(RecordingTransport::default());
    let log = Arc::new(MemoryLog::default());
    let prefs = Arc::new(MemoryPreferences::with("p-1", reachable()));
    let (outbox, mut worker) = outbox::channel(
        8,
        NotificationRouter::new(transport.clone()),
        prefs,
        log.clone(),
    );

    assert!(outbox.enqueue(alert(Severity::Critical)));
    assert!(outbox.enqueue(alert(Severity::Info)));
    let mut other = alert(Severity::Warning);
    other.subject_id = "p-2".into();
    assert!(outbox.enqueue(other));

    assert_eq!(worker.drain().await, 3);
    assert_eq!(worker.drain().await, 0);

    let records = log.records.lock().unwrap();
    let statuses: Vec<_> = records.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            DeliveryStatus::Dispatched,
            DeliveryStatus::Skipped,
            DeliveryStatus::Skipped,
        ]
    );
    assert_eq!(records[0].message_id.as_deref(), Some("<1@test>"));
    assert_eq!(records[1].detail.as_deref(), Some("severity_opted_out"));
    // p-2 has default preferences, which carry no address.
    assert_eq!(records[2].detail.as_deref(), Some("no_recipient"));
    assert_eq!(transport.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn full_queue_drops_instead_of_blocking() {
    let log = Arc::new(MemoryLog::default());
    let (outbox, mut worker) = outbox::channel(
        1,
        NotificationRouter::new(Arc::new(RecordingTransport::default())),
        Arc::new(MemoryPreferences::default()),
        log.clone(),
    );

    assert!(outbox.enqueue(alert(Severity::Critical)));
    assert!(!outbox.enqueue(alert(Severity::Warning)));
    assert_eq!(worker.drain().await, 1);
    assert_eq!(log.records.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn preference_failure_is_recorded_as_failed() {
    let log = Arc::new(MemoryLog::default());
    let (outbox, mut worker) = outbox::channel(
        4,
        NotificationRouter::new(Arc::new(RecordingTransport::default())),
        Arc::new(UnavailablePreferences),
        log.clone(),
    );

    outbox.enqueue(alert(Severity::Critical));
    worker.drain().await;

    let records = log.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, DeliveryStatus::Failed);
    assert!(records[0].detail.as_deref().unwrap().contains("database is locked"));
}

#[tokio::test]
async fn worker_run_exits_when_outbox_dropped() {
    let log = Arc::new(MemoryLog::default());
    let (outbox, worker) = outbox::channel(
        4,
        NotificationRouter::new(Arc::new(FailingTransport)),
        Arc::new(MemoryPreferences::with("p-1", reachable())),
        log.clone(),
    );
    let handle = tokio::spawn(worker.run());

    outbox.enqueue(alert(Severity::Critical));
    drop(outbox);
    handle.await.unwrap();

    let records = log.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, DeliveryStatus::Failed);
}
