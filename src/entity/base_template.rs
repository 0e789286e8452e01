//! Report base template: one per generated report section.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::TemplateType;

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "base_templates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub template_type: TemplateType,
    pub position: i32,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub created: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
