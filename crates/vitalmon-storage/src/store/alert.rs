use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr,
};
use vitalmon_common::types::{Alert, ReadingKind, Severity};

use crate::entities::alert::{self, Column, Entity};
use crate::error::{Result, StorageError};
use crate::store::HealthStore;
use crate::AlertStore;

/// Inbox listing filter.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub severity: Option<Severity>,
    pub unread_only: bool,
}

fn to_alert(m: alert::Model) -> Result<Alert> {
    Ok(Alert {
        severity: m.severity.parse().map_err(|detail| StorageError::InvalidRow {
            column: "severity",
            detail,
        })?,
        source: m.source.parse().map_err(|detail| StorageError::InvalidRow {
            column: "source",
            detail,
        })?,
        id: m.id,
        subject_id: m.subject_id,
        title: m.title,
        message: m.message,
        related_kind: m.related_kind.map(ReadingKind::from),
        observed_at: m.observed_at.with_timezone(&Utc),
        created_at: m.created_at.with_timezone(&Utc),
        is_read: m.is_read,
        fingerprint: m.fingerprint,
    })
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl HealthStore {
    /// Inserts a new alert.
    ///
    /// Returns [`StorageError::DuplicateFingerprint`] when the fingerprint is
    /// already taken.
    pub async fn insert_alert(&self, row: &Alert) -> Result<Alert> {
        let am = alert::ActiveModel {
            id: Set(row.id.clone()),
            subject_id: Set(row.subject_id.clone()),
            severity: Set(row.severity.to_string()),
            title: Set(row.title.clone()),
            message: Set(row.message.clone()),
            source: Set(row.source.to_string()),
            related_kind: Set(row.related_kind.as_ref().map(|k| k.to_string())),
            observed_at: Set(row.observed_at.fixed_offset()),
            created_at: Set(row.created_at.fixed_offset()),
            is_read: Set(row.is_read),
            fingerprint: Set(row.fingerprint.clone()),
        };
        match am.insert(self.db()).await {
            Ok(model) => to_alert(model),
            Err(e) if is_unique_violation(&e) => Err(StorageError::DuplicateFingerprint),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_alert_by_id(&self, id: &str) -> Result<Option<Alert>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        model.map(to_alert).transpose()
    }

    pub async fn find_alert_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Alert>> {
        let model = Entity::find()
            .filter(Column::Fingerprint.eq(fingerprint))
            .one(self.db())
            .await?;
        model.map(to_alert).transpose()
    }

    pub async fn latest_alert_with_severity_since(
        &self,
        subject_id: &str,
        severity: Severity,
        since: DateTime<Utc>,
    ) -> Result<Option<Alert>> {
        let model = Entity::find()
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::Severity.eq(severity.as_str()))
            .filter(Column::CreatedAt.gt(since.fixed_offset()))
            .order_by(Column::CreatedAt, Order::Desc)
            .one(self.db())
            .await?;
        model.map(to_alert).transpose()
    }

    pub async fn latest_alert_with_title_since(
        &self,
        subject_id: &str,
        title: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Alert>> {
        let model = Entity::find()
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::Title.eq(title))
            .filter(Column::CreatedAt.gt(since.fixed_offset()))
            .order_by(Column::CreatedAt, Order::Desc)
            .one(self.db())
            .await?;
        model.map(to_alert).transpose()
    }

    /// Lists a subject's alerts, newest first.
    pub async fn list_alerts(
        &self,
        subject_id: &str,
        filter: &AlertFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Alert>> {
        let mut q = Entity::find().filter(Column::SubjectId.eq(subject_id));
        if let Some(sev) = filter.severity {
            q = q.filter(Column::Severity.eq(sev.as_str()));
        }
        if filter.unread_only {
            q = q.filter(Column::IsRead.eq(false));
        }
        let rows = q
            .order_by(Column::CreatedAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_alert).collect()
    }

    pub async fn unread_count(&self, subject_id: &str) -> Result<u64> {
        Ok(Entity::find()
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::IsRead.eq(false))
            .count(self.db())
            .await?)
    }

    /// Marks one alert read. Returns true if it was unread.
    pub async fn mark_read(&self, id: &str) -> Result<bool> {
        let res = Entity::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .filter(Column::Id.eq(id))
            .filter(Column::IsRead.eq(false))
            .exec(self.db())
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// Marks every unread alert of a subject read. Returns the number flipped.
    pub async fn mark_all_read(&self, subject_id: &str) -> Result<u64> {
        let res = Entity::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::IsRead.eq(false))
            .exec(self.db())
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn delete_alert(&self, id: &str) -> Result<bool> {
        let res = Entity::delete_by_id(id).exec(self.db()).await?;
        Ok(res.rows_affected > 0)
    }
}

#[async_trait]
impl AlertStore for HealthStore {
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<Alert>> {
        self.find_alert_by_fingerprint(fingerprint).await
    }

    async fn latest_with_severity_since(
        &self,
        subject_id: &str,
        severity: Severity,
        since: DateTime<Utc>,
    ) -> Result<Option<Alert>> {
        self.latest_alert_with_severity_since(subject_id, severity, since)
            .await
    }

    async fn latest_with_title_since(
        &self,
        subject_id: &str,
        title: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Alert>> {
        self.latest_alert_with_title_since(subject_id, title, since)
            .await
    }

    async fn insert(&self, alert: &Alert) -> Result<Alert> {
        self.insert_alert(alert).await
    }
}
