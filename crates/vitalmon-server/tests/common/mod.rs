#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use vitalmon_common::types::{NotificationPreferences, Reading, ReadingKind, ReadingValue};
use vitalmon_notify::{DeliveryReceipt, EmailMessage, EmailTransport, NotifyError};
use vitalmon_server::app::{build_app, App};
use vitalmon_server::config::ServerConfig;

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: bool,
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    async fn send(&self, message: &EmailMessage) -> vitalmon_notify::Result<DeliveryReceipt> {
        if self.fail {
            return Err(NotifyError::Smtp("421 service not available".into()));
        }
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

pub struct TestContext {
    pub temp_dir: TempDir,
    pub app: App,
    pub transport: Arc<RecordingTransport>,
}

pub async fn build_test_context() -> Result<TestContext> {
    build_test_context_with(RecordingTransport::default(), |_| {}).await
}

pub async fn build_test_context_with(
    transport: RecordingTransport,
    tweak: impl FnOnce(&mut ServerConfig),
) -> Result<TestContext> {
    vitalmon_common::id::init(1, 1)?;

    let temp_dir = tempfile::tempdir()?;
    let mut config = ServerConfig::default();
    config.database.data_dir = temp_dir.path().to_string_lossy().to_string();
    tweak(&mut config);

    let transport = Arc::new(transport);
    let app = build_app(&config, transport.clone()).await?;
    Ok(TestContext {
        temp_dir,
        app,
        transport,
    })
}

impl TestContext {
    pub async fn opt_in(&self, subject_id: &str) -> Result<()> {
        let prefs = NotificationPreferences {
            email_address: Some(format!("{subject_id}@example.com")),
            ..Default::default()
        };
        self.app.store.upsert_preferences(subject_id, &prefs).await?;
        Ok(())
    }

    pub async fn store_reading(
        &self,
        subject_id: &str,
        kind: ReadingKind,
        value: ReadingValue,
        observed_at: DateTime<Utc>,
    ) -> Result<Reading> {
        let reading = Reading {
            id: vitalmon_common::id::next_id(),
            subject_id: subject_id.to_string(),
            unit: kind.default_unit().to_string(),
            kind,
            value,
            observed_at,
        };
        self.app.store.insert_reading(&reading).await?;
        Ok(reading)
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.transport.sent.lock().unwrap().clone()
    }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn minutes_ago(n: i64) -> DateTime<Utc> {
    fixed_now() - Duration::minutes(n)
}
