//! Initial audit of a case: stage completion dates, compliance decisions,
//! the statement regime and the 12-week retest fields.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{
    AccessibilityStatementState, DisproportionateBurden, ExemptionsState,
    StatementComplianceState, WebsiteComplianceState,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub case_id: i32,
    pub version: i32,
    pub date_of_test: Date,
    /// Fixed at creation: `true` for the structured statement checks,
    /// `false` for the legacy free-form statement fields.
    pub uses_statement_checks: bool,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,

    // Initial WCAG test
    pub audit_metadata_complete_date: Option<Date>,
    pub audit_pages_complete_date: Option<Date>,
    pub website_compliance_state: WebsiteComplianceState,
    #[sea_orm(column_type = "Text")]
    pub website_compliance_notes: String,
    pub audit_website_decision_complete_date: Option<Date>,
    pub audit_wcag_summary_complete_date: Option<Date>,

    // Initial statement (structured)
    pub audit_statement_overview_complete_date: Option<Date>,
    pub audit_statement_website_complete_date: Option<Date>,
    pub audit_statement_compliance_complete_date: Option<Date>,
    pub audit_statement_non_accessible_complete_date: Option<Date>,
    pub audit_statement_preparation_complete_date: Option<Date>,
    pub audit_statement_feedback_complete_date: Option<Date>,
    pub audit_statement_custom_complete_date: Option<Date>,

    // Initial statement (legacy)
    pub accessibility_statement_state: AccessibilityStatementState,
    #[sea_orm(column_type = "Text")]
    pub accessibility_statement_notes: String,
    pub archive_exemptions_state: ExemptionsState,
    #[sea_orm(column_type = "Text")]
    pub archive_exemptions_notes: String,
    pub archive_audit_statement_1_complete_date: Option<Date>,
    pub archive_audit_statement_2_complete_date: Option<Date>,

    // Initial statement decision
    pub disproportionate_burden_claim: DisproportionateBurden,
    #[sea_orm(column_type = "Text")]
    pub disproportionate_burden_notes: String,
    pub audit_disproportionate_burden_complete_date: Option<Date>,
    pub statement_compliance_state: StatementComplianceState,
    #[sea_orm(column_type = "Text")]
    pub statement_compliance_notes: String,
    pub audit_statement_decision_complete_date: Option<Date>,
    pub audit_statement_summary_complete_date: Option<Date>,

    // 12-week retest
    pub retest_date: Option<Date>,
    pub audit_retest_metadata_complete_date: Option<Date>,
    pub audit_retest_pages_complete_date: Option<Date>,
    pub retest_website_compliance_state: WebsiteComplianceState,
    #[sea_orm(column_type = "Text")]
    pub retest_website_compliance_notes: String,
    pub audit_retest_website_decision_complete_date: Option<Date>,
    pub audit_retest_wcag_summary_complete_date: Option<Date>,
    pub audit_retest_statement_overview_complete_date: Option<Date>,
    pub audit_retest_statement_custom_complete_date: Option<Date>,
    pub retest_disproportionate_burden_claim: DisproportionateBurden,
    #[sea_orm(column_type = "Text")]
    pub retest_disproportionate_burden_notes: String,
    pub retest_statement_compliance_state: StatementComplianceState,
    #[sea_orm(column_type = "Text")]
    pub retest_statement_compliance_notes: String,
    pub audit_retest_statement_decision_complete_date: Option<Date>,

    // Report freshness
    pub unpublished_report_data_updated_time: Option<DateTimeUtc>,
    pub published_report_data_updated_time: Option<DateTimeUtc>,
}

impl Model {
    /// Whether this audit still uses the pre-2023 statement fields.
    pub fn uses_legacy_statement(&self) -> bool {
        !self.uses_statement_checks
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
    #[sea_orm(has_many = "super::page::Entity")]
    Pages,
    #[sea_orm(has_many = "super::check_result::Entity")]
    CheckResults,
    #[sea_orm(has_many = "super::statement_check_result::Entity")]
    StatementCheckResults,
}

impl Related<super::case::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Case.def()
    }
}

impl Related<super::page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pages.def()
    }
}

impl Related<super::check_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckResults.def()
    }
}

impl Related<super::statement_check_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatementCheckResults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
