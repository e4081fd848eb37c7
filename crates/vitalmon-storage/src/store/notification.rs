use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder,
};
use vitalmon_common::types::DeliveryRecord;

use crate::entities::notification_log::{self, Column, Entity};
use crate::error::{Result, StorageError};
use crate::store::HealthStore;

fn to_record(m: notification_log::Model) -> Result<DeliveryRecord> {
    Ok(DeliveryRecord {
        severity: m.severity.parse().map_err(|detail| StorageError::InvalidRow {
            column: "severity",
            detail,
        })?,
        status: m.status.parse().map_err(|detail| StorageError::InvalidRow {
            column: "status",
            detail,
        })?,
        id: m.id,
        alert_id: m.alert_id,
        subject_id: m.subject_id,
        detail: m.detail,
        message_id: m.message_id,
        created_at: m.created_at.with_timezone(&Utc),
    })
}

impl HealthStore {
    pub async fn insert_delivery_record(&self, rec: &DeliveryRecord) -> Result<()> {
        let am = notification_log::ActiveModel {
            id: Set(rec.id.clone()),
            alert_id: Set(rec.alert_id.clone()),
            subject_id: Set(rec.subject_id.clone()),
            severity: Set(rec.severity.to_string()),
            status: Set(rec.status.to_string()),
            detail: Set(rec.detail.clone()),
            message_id: Set(rec.message_id.clone()),
            created_at: Set(rec.created_at.fixed_offset()),
        };
        am.insert(self.db()).await?;
        Ok(())
    }

    /// Delivery attempts for one alert, oldest first.
    pub async fn list_delivery_records(&self, alert_id: &str) -> Result<Vec<DeliveryRecord>> {
        let rows = Entity::find()
            .filter(Column::AlertId.eq(alert_id))
            .order_by(Column::CreatedAt, Order::Asc)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_record).collect()
    }
}
