//! Equality-body retest, numbered within its case.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::retest::ORIGINAL_TEST_ID_WITHIN_CASE;
use crate::models::{RetestComplianceState, StatementComplianceState};

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "retests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub case_id: i32,
    /// `0` is the synthetic row standing for the original test.
    pub id_within_case: i32,
    pub version: i32,
    pub date_of_retest: Option<Date>,
    #[sea_orm(column_type = "Text")]
    pub retest_notes: String,
    pub retest_metadata_complete_date: Option<Date>,
    pub retest_pages_complete_date: Option<Date>,
    pub retest_compliance_state: RetestComplianceState,
    #[sea_orm(column_type = "Text")]
    pub compliance_notes: String,
    pub retest_compliance_complete_date: Option<Date>,
    pub statement_compliance_state: StatementComplianceState,
    pub retest_statement_decision_complete_date: Option<Date>,
    pub retest_comparison_complete_date: Option<Date>,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub is_deleted: bool,
}

impl Model {
    pub fn is_original_test(&self) -> bool {
        self.id_within_case == ORIGINAL_TEST_ID_WITHIN_CASE
    }

    pub fn label(&self) -> String {
        if self.is_original_test() {
            "12-week WCAG test".to_string()
        } else {
            format!("Retest #{}", self.id_within_case)
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::case::Entity",
        from = "Column::CaseId",
        to = "super::case::Column::Id"
    )]
    Case,
    #[sea_orm(has_many = "super::retest_page::Entity")]
    RetestPages,
}

impl Related<super::case::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Case.def()
    }
}

impl Related<super::retest_page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RetestPages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
