use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub subject_id: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub source: String,
    pub related_kind: Option<String>,
    pub observed_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub is_read: bool,
    #[sea_orm(unique)]
    pub fingerprint: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
