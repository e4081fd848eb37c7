use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, EntityTrait};
use vitalmon_common::types::NotificationPreferences;

use crate::entities::notification_preference::{self, Column, Entity};
use crate::error::Result;
use crate::store::HealthStore;

impl HealthStore {
    /// Returns the stored preferences, or the defaults when the subject has
    /// never saved any.
    pub async fn get_preferences(&self, subject_id: &str) -> Result<NotificationPreferences> {
        match Entity::find_by_id(subject_id).one(self.db()).await? {
            Some(m) => Ok(serde_json::from_str(&m.preferences_json)?),
            None => Ok(NotificationPreferences::default()),
        }
    }

    pub async fn upsert_preferences(
        &self,
        subject_id: &str,
        prefs: &NotificationPreferences,
    ) -> Result<()> {
        let am = notification_preference::ActiveModel {
            subject_id: Set(subject_id.to_owned()),
            preferences_json: Set(serde_json::to_string(prefs)?),
            updated_at: Set(Utc::now().fixed_offset()),
        };
        Entity::insert(am)
            .on_conflict(
                OnConflict::column(Column::SubjectId)
                    .update_column(Column::PreferencesJson)
                    .update_column(Column::UpdatedAt)
                    .to_owned(),
            )
            .exec(self.db())
            .await?;
        Ok(())
    }
}
