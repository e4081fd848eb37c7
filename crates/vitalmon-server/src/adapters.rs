//! Storage-backed implementations of the notification seams.

use async_trait::async_trait;
use std::sync::Arc;
use vitalmon_common::types::{DeliveryRecord, NotificationPreferences};
use vitalmon_notify::{DeliveryLog, NotifyError, PreferenceSource};
use vitalmon_storage::HealthStore;

pub struct StorePreferences(pub Arc<HealthStore>);

#[async_trait]
impl PreferenceSource for StorePreferences {
    async fn preferences(
        &self,
        subject_id: &str,
    ) -> vitalmon_notify::Result<NotificationPreferences> {
        self.0
            .get_preferences(subject_id)
            .await
            .map_err(|e| NotifyError::Preferences(e.to_string()))
    }
}

pub struct StoreDeliveryLog(pub Arc<HealthStore>);

#[async_trait]
impl DeliveryLog for StoreDeliveryLog {
    async fn record(&self, record: &DeliveryRecord) -> vitalmon_notify::Result<()> {
        self.0
            .insert_delivery_record(record)
            .await
            .map_err(|e| NotifyError::Log(e.to_string()))
    }
}
