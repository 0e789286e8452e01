//! Accessibility statement check catalogue entry.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::StatementCheckType;
use crate::models::catalogue::in_validity_window;

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "statement_checks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub check_type: StatementCheckType,
    pub position: i32,
    pub label: String,
    #[sea_orm(column_type = "Text")]
    pub success_criteria: String,
    #[sea_orm(column_type = "Text")]
    pub report_text: String,
    pub date_start: Date,
    pub date_end: Option<Date>,
    pub created: DateTimeUtc,
}

impl Model {
    pub fn is_valid_on(&self, date: Date) -> bool {
        in_validity_window(Some(self.date_start), self.date_end, date)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::statement_check_result::Entity")]
    Results,
}

impl Related<super::statement_check_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Results.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
