//! Immutable published report snapshot.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "s3_reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub case_id: i32,
    pub version: i32,
    #[sea_orm(unique)]
    pub guid: String,
    pub report_version: String,
    /// Organisation slug at publication time; part of the key.
    pub clean_org: String,
    #[sea_orm(column_type = "Text")]
    pub html: String,
    pub latest_published: bool,
    /// Blob store key, derived from the other columns at publication.
    pub key: String,
    pub created: DateTimeUtc,
    pub created_by_id: Option<i32>,
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
