mod common;

use chrono::Duration;
use common::{build_test_context, build_test_context_with, fixed_now, minutes_ago, RecordingTransport};
use vitalmon_common::types::{
    AlertSource, DeliveryStatus, NotificationPreferences, ReadingKind, ReadingValue, Severity,
};
use vitalmon_storage::AlertFilter;

#[tokio::test]
async fn critical_reading_is_persisted_and_emailed() {
    let mut ctx = build_test_context_with(RecordingTransport::default(), |c| {
        c.evaluation.full_pass_on_ingest = false;
    })
    .await
    .unwrap();
    ctx.opt_in("p-1").await.unwrap();

    let reading = ctx
        .store_reading(
            "p-1",
            ReadingKind::HeartRate,
            ReadingValue::Scalar(125.0),
            minutes_ago(5),
        )
        .await
        .unwrap();
    let report = ctx
        .app
        .pipeline
        .on_reading_persisted_at(&reading, fixed_now())
        .await
        .unwrap();

    assert_eq!(report.candidates, 1);
    assert_eq!(report.persisted, 1);
    assert_eq!(ctx.app.worker.drain().await, 1);

    let alerts = ctx
        .app
        .store
        .list_alerts("p-1", &AlertFilter::default(), 10, 0)
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::Critical);
    assert_eq!(alerts[0].title, "High Heart Rate");
    assert!(alerts[0].message.contains("125"));

    let sent = ctx.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "p-1@example.com");
    assert_eq!(sent[0].subject, "[Critical] High Heart Rate");

    let records = ctx
        .app
        .store
        .list_delivery_records(&alerts[0].id)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, DeliveryStatus::Dispatched);
    assert_eq!(records[0].message_id.as_deref(), Some("<1@test>"));
}

#[tokio::test]
async fn full_pass_on_ingest_adds_reminders_but_rate_limits_them() {
    let mut ctx = build_test_context().await.unwrap();
    ctx.opt_in("p-1").await.unwrap();

    let reading = ctx
        .store_reading(
            "p-1",
            ReadingKind::HeartRate,
            ReadingValue::Scalar(125.0),
            minutes_ago(5),
        )
        .await
        .unwrap();
    let report = ctx
        .app
        .pipeline
        .on_reading_persisted_at(&reading, fixed_now())
        .await
        .unwrap();

    // One critical plus three missed-reading reminders; the reminders share
    // the info severity so only the first survives the window.
    assert_eq!(report.candidates, 4);
    assert_eq!(report.persisted, 2);
    assert_eq!(report.suppressed, 2);

    assert_eq!(ctx.app.worker.drain().await, 2);
    // Info emails are off by default.
    assert_eq!(ctx.sent().len(), 1);

    let alerts = ctx
        .app
        .store
        .list_alerts("p-1", &AlertFilter::default(), 10, 0)
        .await
        .unwrap();
    assert!(alerts
        .iter()
        .any(|a| a.source == AlertSource::MissedReading && a.severity == Severity::Info));
    assert!(alerts
        .iter()
        .all(|a| a.source != AlertSource::PositiveReinforcement));
}

#[tokio::test]
async fn scheduled_passes_after_ingest_persist_nothing_new() {
    let mut ctx = build_test_context().await.unwrap();
    let reading = ctx
        .store_reading(
            "p-1",
            ReadingKind::BloodPressure,
            ReadingValue::BloodPressure {
                systolic: 150.0,
                diastolic: 85.0,
            },
            minutes_ago(30),
        )
        .await
        .unwrap();
    let ingest = ctx
        .app
        .pipeline
        .on_reading_persisted_at(&reading, minutes_ago(30))
        .await
        .unwrap();
    // The warning plus the first of three missed-reading reminders.
    assert_eq!(ingest.persisted, 2);

    for now in [fixed_now(), fixed_now() + Duration::minutes(10)] {
        let report = ctx
            .app
            .pipeline
            .evaluate_subject("p-1", now)
            .await
            .unwrap();
        assert_eq!(report.persisted, 0);
        assert_eq!(report.suppressed, report.candidates);
    }

    let warnings = AlertFilter {
        severity: Some(Severity::Warning),
        ..Default::default()
    };
    let alerts = ctx
        .app
        .store
        .list_alerts("p-1", &warnings, 10, 0)
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].title, "High Blood Pressure");
    ctx.app.worker.drain().await;
}

#[tokio::test]
async fn scheduled_pass_does_not_re_raise_old_out_of_range_readings() {
    let mut ctx = build_test_context_with(RecordingTransport::default(), |c| {
        c.evaluation.full_pass_on_ingest = false;
    })
    .await
    .unwrap();
    ctx.opt_in("p-1").await.unwrap();

    let first = ctx
        .store_reading(
            "p-1",
            ReadingKind::HeartRate,
            ReadingValue::Scalar(125.0),
            minutes_ago(600),
        )
        .await
        .unwrap();
    let report = ctx
        .app
        .pipeline
        .on_reading_persisted_at(&first, minutes_ago(600))
        .await
        .unwrap();
    assert_eq!(report.persisted, 1);

    let second = ctx
        .store_reading(
            "p-1",
            ReadingKind::HeartRate,
            ReadingValue::Scalar(130.0),
            minutes_ago(540),
        )
        .await
        .unwrap();
    let report = ctx
        .app
        .pipeline
        .on_reading_persisted_at(&second, minutes_ago(540))
        .await
        .unwrap();
    assert_eq!(report.persisted, 0);
    assert_eq!(report.suppressed, 1);

    // Both readings are now older than the 6h window.
    let scheduled = ctx
        .app
        .pipeline
        .evaluate_subject("p-1", fixed_now())
        .await
        .unwrap();
    // Only the missed-reading reminders for the other three kinds.
    assert_eq!(scheduled.candidates, 3);
    assert_eq!(scheduled.persisted, 1);
    ctx.app.worker.drain().await;

    let critical = AlertFilter {
        severity: Some(Severity::Critical),
        ..Default::default()
    };
    let alerts = ctx
        .app
        .store
        .list_alerts("p-1", &critical, 10, 0)
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].message.contains("125"));

    let critical_emails = ctx
        .sent()
        .iter()
        .filter(|m| m.subject.starts_with("[Critical]"))
        .count();
    assert_eq!(critical_emails, 1);
}

#[tokio::test]
async fn transport_failure_does_not_fail_the_pass() {
    let transport = RecordingTransport {
        fail: true,
        ..Default::default()
    };
    let mut ctx = build_test_context_with(transport, |c| {
        c.evaluation.full_pass_on_ingest = false;
    })
    .await
    .unwrap();
    ctx.opt_in("p-1").await.unwrap();

    let reading = ctx
        .store_reading(
            "p-1",
            ReadingKind::BloodPressure,
            ReadingValue::BloodPressure {
                systolic: 185.0,
                diastolic: 95.0,
            },
            minutes_ago(1),
        )
        .await
        .unwrap();
    let report = ctx
        .app
        .pipeline
        .on_reading_persisted_at(&reading, fixed_now())
        .await
        .unwrap();
    assert_eq!(report.persisted, 1);
    ctx.app.worker.drain().await;

    let alerts = ctx
        .app
        .store
        .list_alerts("p-1", &AlertFilter::default(), 10, 0)
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::Critical);

    let records = ctx
        .app
        .store
        .list_delivery_records(&alerts[0].id)
        .await
        .unwrap();
    assert_eq!(records[0].status, DeliveryStatus::Failed);
    assert!(records[0].detail.as_deref().unwrap().contains("421"));
}

#[tokio::test]
async fn disabled_notifications_are_recorded_as_skipped() {
    let mut ctx = build_test_context_with(RecordingTransport::default(), |c| {
        c.evaluation.full_pass_on_ingest = false;
    })
    .await
    .unwrap();
    let prefs = NotificationPreferences {
        email_notifications: false,
        email_address: Some("p-1@example.com".into()),
        ..Default::default()
    };
    ctx.app.store.upsert_preferences("p-1", &prefs).await.unwrap();

    let reading = ctx
        .store_reading(
            "p-1",
            ReadingKind::HeartRate,
            ReadingValue::Scalar(45.0),
            minutes_ago(1),
        )
        .await
        .unwrap();
    ctx.app
        .pipeline
        .on_reading_persisted_at(&reading, fixed_now())
        .await
        .unwrap();
    ctx.app.worker.drain().await;

    assert!(ctx.sent().is_empty());
    let alerts = ctx
        .app
        .store
        .list_alerts("p-1", &AlertFilter::default(), 10, 0)
        .await
        .unwrap();
    let records = ctx
        .app
        .store
        .list_delivery_records(&alerts[0].id)
        .await
        .unwrap();
    assert_eq!(records[0].status, DeliveryStatus::Skipped);
    assert_eq!(records[0].detail.as_deref(), Some("notifications_disabled"));
}

#[tokio::test]
async fn scheduler_cycle_covers_recently_active_subjects() {
    let mut ctx = build_test_context().await.unwrap();

    // p-1 logged every core kind within normal ranges.
    let normal = [
        (ReadingKind::HeartRate, ReadingValue::Scalar(72.0)),
        (
            ReadingKind::BloodPressure,
            ReadingValue::BloodPressure {
                systolic: 118.0,
                diastolic: 76.0,
            },
        ),
        (ReadingKind::GlucoseLevel, ReadingValue::Scalar(100.0)),
        (ReadingKind::BodyTemperature, ReadingValue::Scalar(98.6)),
    ];
    for (i, (kind, value)) in normal.into_iter().enumerate() {
        ctx.store_reading("p-1", kind, value, minutes_ago(60 + i as i64))
            .await
            .unwrap();
    }
    // p-2 has a high heart rate that never went through ingest.
    ctx.store_reading(
        "p-2",
        ReadingKind::HeartRate,
        ReadingValue::Scalar(130.0),
        minutes_ago(30),
    )
    .await
    .unwrap();
    // p-3 went quiet ten days ago.
    ctx.store_reading(
        "p-3",
        ReadingKind::HeartRate,
        ReadingValue::Scalar(130.0),
        fixed_now() - Duration::days(10),
    )
    .await
    .unwrap();

    let summary = ctx.app.scheduler.run_cycle(fixed_now()).await.unwrap();
    assert_eq!(summary.subjects, 2);
    assert_eq!(summary.failed, 0);
    // p-1 gets its completion message. p-2 gets one reminder, and its
    // out-of-range reading still holds back positive reinforcement.
    assert_eq!(summary.persisted, 2);

    let p1 = ctx
        .app
        .store
        .list_alerts("p-1", &AlertFilter::default(), 10, 0)
        .await
        .unwrap();
    assert_eq!(p1.len(), 1);
    assert_eq!(p1[0].title, "Daily Health Tasks Completed");
    assert_eq!(p1[0].source, AlertSource::PositiveReinforcement);

    let p2 = ctx
        .app
        .store
        .list_alerts("p-2", &AlertFilter::default(), 10, 0)
        .await
        .unwrap();
    assert_eq!(p2.len(), 1);
    assert_eq!(p2[0].source, AlertSource::MissedReading);
    assert_eq!(p2[0].severity, Severity::Info);

    let p3 = ctx
        .app
        .store
        .list_alerts("p-3", &AlertFilter::default(), 10, 0)
        .await
        .unwrap();
    assert!(p3.is_empty());

    ctx.app.worker.drain().await;
}
