//! Page in scope of an equality-body retest.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "retest_pages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub retest_id: i32,
    pub page_id: i32,
    pub version: i32,
    pub complete_date: Option<Date>,
    pub missing_date: Option<Date>,
    #[sea_orm(column_type = "Text")]
    pub additional_issues_notes: String,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::retest::Entity",
        from = "Column::RetestId",
        to = "super::retest::Column::Id"
    )]
    Retest,
    #[sea_orm(
        belongs_to = "super::page::Entity",
        from = "Column::PageId",
        to = "super::page::Column::Id"
    )]
    Page,
    #[sea_orm(has_many = "super::retest_check_result::Entity")]
    RetestCheckResults,
}

impl Related<super::retest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Retest.def()
    }
}

impl Related<super::retest_check_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RetestCheckResults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
