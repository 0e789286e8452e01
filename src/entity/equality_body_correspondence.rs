//! Correspondence with the equality body about a closed case.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{CorrespondenceStatus, CorrespondenceType};

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "equality_body_correspondence")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub case_id: i32,
    pub id_within_case: i32,
    pub version: i32,
    pub correspondence_type: CorrespondenceType,
    pub status: CorrespondenceStatus,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    #[sea_orm(column_type = "Text")]
    pub notes: String,
    pub zendesk_url: String,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::case::Entity",
        from = "Column::CaseId",
        to = "super::case::Column::Id"
    )]
    Case,
}

impl Related<super::case::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Case.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
