//! Result of one statement check for an audit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{StatementCheckResultState, StatementCheckType};

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "statement_check_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub audit_id: i32,
    pub statement_check_id: Option<i32>,
    pub check_type: StatementCheckType,
    /// Stable within the audit regardless of catalogue position changes.
    pub issue_number: i32,
    pub version: i32,
    pub check_result_state: StatementCheckResultState,
    #[sea_orm(column_type = "Text")]
    pub report_comment: String,
    pub retest_state: StatementCheckResultState,
    #[sea_orm(column_type = "Text")]
    pub retest_comment: String,
    pub is_deleted: bool,
}

impl Model {
    pub fn issue_identifier(&self, case_identifier: &str) -> String {
        format!("{}-S-{}", case_identifier.trim_start_matches('#'), self.issue_number)
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
        belongs_to = "super::statement_check::Entity",
        from = "Column::StatementCheckId",
        to = "super::statement_check::Column::Id"
    )]
    StatementCheck,
}

impl Related<super::audit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Audit.def()
    }
}

impl Related<super::statement_check::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatementCheck.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
