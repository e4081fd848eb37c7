use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect,
};
use vitalmon_common::types::{Reading, ReadingKind, ReadingValue};

use crate::entities::reading::{self, Column, Entity};
use crate::error::{Result, StorageError};
use crate::store::HealthStore;

fn to_reading(m: reading::Model) -> Result<Reading> {
    let value = match (m.systolic, m.diastolic, m.value) {
        (Some(systolic), Some(diastolic), _) => ReadingValue::BloodPressure {
            systolic,
            diastolic,
        },
        (_, _, Some(v)) => ReadingValue::Scalar(v),
        _ => {
            return Err(StorageError::InvalidRow {
                column: "value",
                detail: format!("reading {} has no value", m.id),
            })
        }
    };
    Ok(Reading {
        id: m.id,
        subject_id: m.subject_id,
        kind: ReadingKind::from(m.kind),
        value,
        unit: m.unit,
        observed_at: m.observed_at.with_timezone(&Utc),
    })
}

impl HealthStore {
    pub async fn insert_reading(&self, r: &Reading) -> Result<()> {
        let (value, systolic, diastolic) = match r.value {
            ReadingValue::Scalar(v) => (Some(v), None, None),
            ReadingValue::BloodPressure {
                systolic,
                diastolic,
            } => (None, Some(systolic), Some(diastolic)),
        };
        let am = reading::ActiveModel {
            id: Set(r.id.clone()),
            subject_id: Set(r.subject_id.clone()),
            kind: Set(r.kind.to_string()),
            value: Set(value),
            systolic: Set(systolic),
            diastolic: Set(diastolic),
            unit: Set(r.unit.clone()),
            observed_at: Set(r.observed_at.fixed_offset()),
            created_at: Set(Utc::now().fixed_offset()),
        };
        am.insert(self.db()).await?;
        Ok(())
    }

    /// Readings observed at or after `since`, oldest first.
    pub async fn readings_since(
        &self,
        subject_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Reading>> {
        let rows = Entity::find()
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::ObservedAt.gte(since.fixed_offset()))
            .order_by(Column::ObservedAt, Order::Asc)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_reading).collect()
    }

    /// Subjects with at least one reading observed at or after `since`.
    pub async fn active_subjects_since(&self, since: DateTime<Utc>) -> Result<Vec<String>> {
        let ids = Entity::find()
            .select_only()
            .column(Column::SubjectId)
            .distinct()
            .filter(Column::ObservedAt.gte(since.fixed_offset()))
            .order_by(Column::SubjectId, Order::Asc)
            .into_tuple::<String>()
            .all(self.db())
            .await?;
        Ok(ids)
    }
}
