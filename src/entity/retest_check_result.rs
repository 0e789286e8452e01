//! Retest outcome of an issue carried into an equality-body retest.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::RetestState;

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "retest_check_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub retest_id: i32,
    pub retest_page_id: i32,
    /// Initial-test result this issue originates from.
    pub check_result_id: i32,
    pub wcag_definition_id: i32,
    pub version: i32,
    pub retest_state: RetestState,
    #[sea_orm(column_type = "Text")]
    pub retest_notes: String,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::retest_page::Entity",
        from = "Column::RetestPageId",
        to = "super::retest_page::Column::Id"
    )]
    RetestPage,
    #[sea_orm(
        belongs_to = "super::retest::Entity",
        from = "Column::RetestId",
        to = "super::retest::Column::Id"
    )]
    Retest,
}

impl Related<super::retest_page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RetestPage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
