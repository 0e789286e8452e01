//! Generated report section.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::TemplateType;

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sections")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub report_id: i32,
    pub base_template_id: Option<i32>,
    pub name: String,
    pub template_type: TemplateType,
    pub position: i32,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// Auditor-authored replacement for the generated content.
    #[sea_orm(column_type = "Text", nullable)]
    pub content_override: Option<String>,
    pub created: DateTimeUtc,
}

impl Model {
    pub fn effective_content(&self) -> &str {
        self.content_override.as_deref().unwrap_or(&self.content)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::report::Entity",
        from = "Column::ReportId",
        to = "super::report::Column::Id",
        on_delete = "Cascade"
    )]
    Report,
    #[sea_orm(has_many = "super::table_row::Entity")]
    TableRows,
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl Related<super::table_row::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TableRows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
