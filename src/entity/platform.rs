//! Platform-wide settings singleton.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "platform")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub active_qa_auditor_id: Option<i32>,
    #[sea_orm(column_type = "Text")]
    pub footer_links: String,
    pub updated: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ActiveQaAuditorId",
        to = "super::user::Column::Id"
    )]
    ActiveQaAuditor,
}

impl ActiveModelBehavior for ActiveModel {}
