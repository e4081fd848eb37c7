use crate::error::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use std::path::Path;

pub mod alert;
pub mod notification;
pub mod preference;
pub mod reading;

pub use alert::AlertFilter;

/// Unified access to the vitalmon database.
///
/// All methods are `async fn` backed by SeaORM.
pub struct HealthStore {
    pub(crate) db: DatabaseConnection,
}

impl HealthStore {
    /// Connects to `db_url` and runs pending migrations.
    ///
    /// - `db_url`: full connection URL, e.g. `sqlite:///data/vitalmon.db?mode=rwc`.
    /// - `data_dir`: local directory created up front so a SQLite file URL
    ///   pointing into it can be opened.
    pub async fn new(db_url: &str, data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db = Database::connect(db_url).await?;

        if db_url.starts_with("sqlite:") {
            db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
        }

        Migrator::up(&db, None).await?;

        tracing::info!(db_url = %db_url, "Initialized health store");
        Ok(Self { db })
    }

    /// Opens the default SQLite database file inside `data_dir`.
    pub async fn open(data_dir: &Path) -> Result<Self> {
        Self::new(&sqlite_url(data_dir), data_dir).await
    }

    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// The SQLite URL for `vitalmon.db` inside `data_dir`.
pub fn sqlite_url(data_dir: &Path) -> String {
    format!(
        "sqlite://{}?mode=rwc",
        data_dir.join("vitalmon.db").display()
    )
}
