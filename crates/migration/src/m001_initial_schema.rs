use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m001_initial_schema"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(UP_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(DOWN_SQL)
            .await?;
        Ok(())
    }
}

// Blood-pressure readings fill systolic/diastolic; every other kind fills value.
// The fingerprint index is partial: rows may omit a fingerprint, but two
// present fingerprints never collide.
const UP_SQL: &str = "
CREATE TABLE IF NOT EXISTS readings (
    id TEXT PRIMARY KEY NOT NULL,
    subject_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    value REAL,
    systolic REAL,
    diastolic REAL,
    unit TEXT NOT NULL,
    observed_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_readings_subject_observed ON readings(subject_id, observed_at);
CREATE INDEX IF NOT EXISTS idx_readings_observed ON readings(observed_at);

CREATE TABLE IF NOT EXISTS alerts (
    id TEXT PRIMARY KEY NOT NULL,
    subject_id TEXT NOT NULL,
    severity TEXT NOT NULL,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    source TEXT NOT NULL,
    related_kind TEXT,
    observed_at TEXT NOT NULL,
    created_at TEXT NOT NULL,
    is_read INTEGER NOT NULL DEFAULT 0,
    fingerprint TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_alerts_fingerprint
    ON alerts(fingerprint) WHERE fingerprint IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_alerts_subject_severity_created
    ON alerts(subject_id, severity, created_at);
CREATE INDEX IF NOT EXISTS idx_alerts_subject_title_created
    ON alerts(subject_id, title, created_at);

CREATE TABLE IF NOT EXISTS notification_preferences (
    subject_id TEXT PRIMARY KEY NOT NULL,
    preferences_json TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notification_logs (
    id TEXT PRIMARY KEY NOT NULL,
    alert_id TEXT NOT NULL,
    subject_id TEXT NOT NULL,
    severity TEXT NOT NULL,
    status TEXT NOT NULL,
    detail TEXT,
    message_id TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_notification_logs_alert ON notification_logs(alert_id);
CREATE INDEX IF NOT EXISTS idx_notification_logs_created ON notification_logs(created_at);
";

const DOWN_SQL: &str = "
DROP TABLE IF EXISTS notification_logs;
DROP TABLE IF EXISTS notification_preferences;
DROP TABLE IF EXISTS alerts;
DROP TABLE IF EXISTS readings;
";
