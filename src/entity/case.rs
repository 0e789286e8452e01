//! Case entity: the aggregate root of the monitoring workflow.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{
    CaseStatus, CaseVariant, EnforcementBody, EnforcementBodyClosedCase, PsbLocation,
    RecommendationForEnforcement, ReportApprovedStatus, YesNo,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub case_number: i32,
    pub variant: CaseVariant,
    pub case_identifier: String,
    pub version: i32,
    /// Cached copy of the derived status, kept for filtering.
    pub status: CaseStatus,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub created_by_id: Option<i32>,

    // Case details
    pub organisation_name: String,
    pub website_name: String,
    pub home_page_url: String,
    pub domain: String,
    pub enforcement_body: EnforcementBody,
    pub psb_location: PsbLocation,
    pub sector_id: Option<i32>,
    pub subcategory_id: Option<i32>,
    pub is_complaint: YesNo,
    pub previous_case_url: String,
    #[sea_orm(column_type = "Text")]
    pub notes: String,
    pub auditor_id: Option<i32>,
    pub reviewer_id: Option<i32>,
    pub case_details_complete_date: Option<Date>,

    // Report QA
    pub report_ready_for_qa: YesNo,
    pub reporting_details_complete_date: Option<Date>,
    pub report_approved_status: ReportApprovedStatus,
    pub qa_auditor_complete_date: Option<Date>,
    pub qa_approval_complete_date: Option<Date>,
    pub publish_report_complete_date: Option<Date>,

    // Contact details
    pub no_psb_contact: bool,
    pub manage_contact_details_complete_date: Option<Date>,
    pub seven_day_no_contact_email_sent_date: Option<Date>,
    pub request_contact_details_complete_date: Option<Date>,
    pub no_contact_one_week_chaser_due_date: Option<Date>,
    pub no_contact_one_week_chaser_sent_date: Option<Date>,
    pub one_week_contact_details_complete_date: Option<Date>,
    pub no_contact_four_week_chaser_due_date: Option<Date>,
    pub no_contact_four_week_chaser_sent_date: Option<Date>,
    pub four_week_contact_details_complete_date: Option<Date>,

    // Report correspondence
    pub report_sent_date: Option<Date>,
    pub report_sent_on_complete_date: Option<Date>,
    pub report_followup_week_1_due_date: Option<Date>,
    pub report_followup_week_1_sent_date: Option<Date>,
    pub one_week_followup_complete_date: Option<Date>,
    pub report_followup_week_4_due_date: Option<Date>,
    pub report_followup_week_4_sent_date: Option<Date>,
    pub four_week_followup_complete_date: Option<Date>,
    pub report_acknowledged_date: Option<Date>,
    pub report_acknowledged_complete_date: Option<Date>,

    // 12-week correspondence
    pub report_followup_week_12_due_date: Option<Date>,
    pub twelve_week_update_requested_date: Option<Date>,
    pub twelve_week_update_requested_complete_date: Option<Date>,
    pub twelve_week_1_week_chaser_due_date: Option<Date>,
    pub twelve_week_1_week_chaser_sent_date: Option<Date>,
    pub one_week_followup_final_complete_date: Option<Date>,
    pub twelve_week_correspondence_acknowledged_date: Option<Date>,
    pub twelve_week_update_acknowledged_complete_date: Option<Date>,

    // Closing the case
    pub is_ready_for_final_decision: YesNo,
    pub review_changes_complete_date: Option<Date>,
    pub recommendation_for_enforcement: RecommendationForEnforcement,
    #[sea_orm(column_type = "Text")]
    pub recommendation_notes: String,
    pub enforcement_recommendation_complete_date: Option<Date>,
    pub case_close_complete_date: Option<Date>,

    // Equality body
    pub sent_to_enforcement_body_sent_date: Option<Date>,
    pub enforcement_body_closed_case: EnforcementBodyClosedCase,
    pub enforcement_correspondence_complete_date: Option<Date>,

    // Lifecycle
    pub is_deactivated: bool,
    pub deactivate_date: Option<Date>,
    #[sea_orm(column_type = "Text")]
    pub deactivate_notes: String,
    pub is_archived: bool,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuditorId",
        to = "super::user::Column::Id"
    )]
    Auditor,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReviewerId",
        to = "super::user::Column::Id"
    )]
    Reviewer,
    #[sea_orm(
        belongs_to = "super::sector::Entity",
        from = "Column::SectorId",
        to = "super::sector::Column::Id"
    )]
    Sector,
    #[sea_orm(
        belongs_to = "super::sub_category::Entity",
        from = "Column::SubcategoryId",
        to = "super::sub_category::Column::Id"
    )]
    SubCategory,
    #[sea_orm(has_one = "super::audit::Entity")]
    Audit,
    #[sea_orm(has_one = "super::report::Entity")]
    Report,
    #[sea_orm(has_many = "super::contact::Entity")]
    Contacts,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::retest::Entity")]
    Retests,
}

impl Related<super::audit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Audit.def()
    }
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl Related<super::contact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contacts.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::retest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Retests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
