//! Outcome of one WCAG definition on one page of an audit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{CheckResultState, RetestState};

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "check_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub audit_id: i32,
    pub page_id: i32,
    pub wcag_definition_id: i32,
    pub version: i32,
    pub check_result_state: CheckResultState,
    #[sea_orm(column_type = "Text")]
    pub notes: String,
    pub retest_state: RetestState,
    #[sea_orm(column_type = "Text")]
    pub retest_notes: String,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub is_deleted: bool,
}

impl Model {
    pub fn is_failed(&self) -> bool {
        !self.is_deleted && self.check_result_state == CheckResultState::Error
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::audit::Entity",
        from = "Column::AuditId",
        to = "super::audit::Column::Id"
    )]
    Audit,
    #[sea_orm(
        belongs_to = "super::page::Entity",
        from = "Column::PageId",
        to = "super::page::Column::Id"
    )]
    Page,
    #[sea_orm(
        belongs_to = "super::wcag_definition::Entity",
        from = "Column::WcagDefinitionId",
        to = "super::wcag_definition::Column::Id"
    )]
    WcagDefinition,
}

impl Related<super::audit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Audit.def()
    }
}

impl Related<super::page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Page.def()
    }
}

impl Related<super::wcag_definition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WcagDefinition.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
