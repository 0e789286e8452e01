//! Case choice enums and DTOs.

use chrono::NaiveDate;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

choice_enum! {
    /// Case variant. Each variant has its own case numbering and stage table.
    pub enum CaseVariant {
        Simplified => "simplified", "Simplified",
        Detailed => "detailed", "Detailed",
        Mobile => "mobile", "Mobile",
    }
}

impl CaseVariant {
    /// Prefix used in the `#S-1` style case identifier.
    pub fn identifier_prefix(&self) -> &'static str {
        match self {
            Self::Simplified => "S",
            Self::Detailed => "D",
            Self::Mobile => "M",
        }
    }

    /// Build the textual case identifier from a case number.
    pub fn case_identifier(&self, case_number: i32) -> String {
        format!("#{}-{}", self.identifier_prefix(), case_number)
    }
}

choice_enum! {
    /// Derived case status, in workflow order.
    pub enum CaseStatus {
        UnassignedCase => "unassigned-case", "Unassigned case",
        TestInProgress => "test-in-progress", "Test in progress",
        ReportInProgress => "report-in-progress", "Report in progress",
        QaInProgress => "qa-in-progress", "Report in QA",
        ReportReadyToSend => "report-ready-to-send", "Report ready to send",
        InReportCorrespondence => "in-report-correspondence", "Report sent",
        AwaitingTwelveWeekDeadline => "awaiting-12-week-deadline", "Report acknowledged waiting for 12-week deadline",
        AfterTwelveWeekCorrespondence => "after-12-week-correspondence", "After 12-week correspondence",
        ReviewingChanges => "reviewing-changes", "Reviewing changes",
        FinalDecisionDue => "final-decision-due", "Final decision due",
        CaseClosedWaitingToBeSent => "case-closed-waiting-to-be-sent", "Case closed and waiting to be sent to equalities body",
        CaseClosedSentToEqualitiesBody => "case-closed-sent-to-equalities-body", "Case closed and sent to equalities body",
        InCorrespondenceWithEqualitiesBody => "in-correspondence-with-equalities-body", "In correspondence with equalities body",
        Complete => "complete", "Complete",
        Deactivated => "deactivated", "Deactivated",
        Deleted => "deleted", "Deleted",
    }
}

choice_enum! {
    pub enum EnforcementBody {
        Ehrc => "ehrc", "Equality and Human Rights Commission",
        Ecni => "ecni", "Equality Commission Northern Ireland",
    }
}

choice_enum! {
    pub enum PsbLocation {
        Unknown => "unknown", "Unknown",
        England => "england", "England",
        Scotland => "scotland", "Scotland",
        Wales => "wales", "Wales",
        NorthernIreland => "northern_ireland", "Northern Ireland",
        UkWide => "uk_wide", "UK-wide",
    }
}

choice_enum! {
    /// Yes/no form answer.
    pub enum YesNo {
        No => "no", "No",
        Yes => "yes", "Yes",
    }
}

impl YesNo {
    pub fn is_yes(&self) -> bool {
        matches!(self, Self::Yes)
    }
}

choice_enum! {
    pub enum ReportApprovedStatus {
        NotStarted => "not-started", "Not started",
        InProgress => "in-progress", "Further work is needed",
        Approved => "approved", "Yes",
    }
}

choice_enum! {
    /// Whether the equality body has closed its side of the case.
    pub enum EnforcementBodyClosedCase {
        No => "no", "No (or holding)",
        InProgress => "in-progress", "Case in progress",
        Yes => "yes", "Yes",
    }
}

choice_enum! {
    pub enum RecommendationForEnforcement {
        Unknown => "unknown", "Not selected",
        NoFurtherAction => "no-further-action", "No further action",
        Other => "other", "For enforcement consideration",
    }
}

choice_enum! {
    pub enum CaseEventType {
        Create => "create", "Create",
        Auditor => "auditor", "Change of auditor",
        QaAuditor => "qa_auditor", "Change of QA auditor",
        CreateAudit => "create_audit", "Start test",
        Status => "status", "Change of status",
        ApproveReport => "approve_report", "Report approved",
        PublishReport => "publish_report", "Report published",
        StartRetest => "start_retest", "Start retest",
    }
}

/// Request to create a case.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCaseRequest {
    #[serde(default)]
    pub variant: CaseVariant,
    pub organisation_name: String,
    pub home_page_url: String,
    #[serde(default)]
    pub website_name: String,
    #[serde(default)]
    pub enforcement_body: EnforcementBody,
    #[serde(default)]
    pub psb_location: PsbLocation,
    pub sector_id: Option<i32>,
    pub subcategory_id: Option<i32>,
    #[serde(default)]
    pub is_complaint: YesNo,
    #[serde(default)]
    pub previous_case_url: String,
    #[serde(default)]
    pub notes: String,
    pub auditor_id: Option<i32>,
}

/// Case list filters.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CaseListQuery {
    pub status: Option<CaseStatus>,
    pub variant: Option<CaseVariant>,
    pub auditor_id: Option<i32>,
    pub reviewer_id: Option<i32>,
    /// Free-text search over organisation name, domain and case identifier.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Case row in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CaseSummary {
    pub id: i32,
    pub case_identifier: String,
    pub variant: CaseVariant,
    pub organisation_name: String,
    pub domain: String,
    pub status: CaseStatus,
    pub auditor_id: Option<i32>,
    pub reviewer_id: Option<i32>,
    pub report_sent_date: Option<NaiveDate>,
}

/// Manual override of scheduler-derived due dates.
///
/// Fields that are absent are left as they are; `null` clears the date.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DueDateOverride {
    pub version: i32,
    #[serde(default, with = "double_option")]
    pub report_followup_week_1_due_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "double_option")]
    pub report_followup_week_4_due_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "double_option")]
    pub report_followup_week_12_due_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "double_option")]
    pub no_contact_one_week_chaser_due_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "double_option")]
    pub no_contact_four_week_chaser_due_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "double_option")]
    pub twelve_week_1_week_chaser_due_date: Option<Option<NaiveDate>>,
}

impl DueDateOverride {
    /// Convert into the field map applied by the versioned update.
    pub fn into_fields(self) -> serde_json::Map<String, serde_json::Value> {
        let mut fields = serde_json::Map::new();
        let entries = [
            ("report_followup_week_1_due_date", self.report_followup_week_1_due_date),
            ("report_followup_week_4_due_date", self.report_followup_week_4_due_date),
            ("report_followup_week_12_due_date", self.report_followup_week_12_due_date),
            ("no_contact_one_week_chaser_due_date", self.no_contact_one_week_chaser_due_date),
            ("no_contact_four_week_chaser_due_date", self.no_contact_four_week_chaser_due_date),
            ("twelve_week_1_week_chaser_due_date", self.twelve_week_1_week_chaser_due_date),
        ];
        for (name, value) in entries {
            if let Some(date) = value {
                let json = date
                    .map(|d| serde_json::Value::String(d.format("%Y-%m-%d").to_string()))
                    .unwrap_or(serde_json::Value::Null);
                fields.insert(name.to_string(), json);
            }
        }
        fields
    }
}

/// Distinguishes an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Deactivation request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeactivateCaseRequest {
    pub version: i32,
    #[serde(default)]
    pub deactivate_notes: String,
}

/// Entry of the combined case history view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CaseHistoryEntry {
    pub created: chrono::DateTime<chrono::Utc>,
    pub kind: String,
    pub author_id: Option<i32>,
    pub summary: String,
    #[schema(value_type = Object)]
    pub detail: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_identifier_per_variant() {
        assert_eq!(CaseVariant::Simplified.case_identifier(1), "#S-1");
        assert_eq!(CaseVariant::Detailed.case_identifier(42), "#D-42");
        assert_eq!(CaseVariant::Mobile.case_identifier(7), "#M-7");
    }

    #[test]
    fn test_status_order_follows_workflow() {
        assert!(CaseStatus::UnassignedCase < CaseStatus::TestInProgress);
        assert!(CaseStatus::FinalDecisionDue < CaseStatus::CaseClosedWaitingToBeSent);
        assert!(CaseStatus::Complete < CaseStatus::Deleted);
    }

    #[test]
    fn test_due_date_override_only_includes_present_fields() {
        let body: DueDateOverride = serde_json::from_value(serde_json::json!({
            "version": 2,
            "report_followup_week_1_due_date": "2024-03-09",
            "report_followup_week_4_due_date": null
        }))
        .unwrap();
        let fields = body.into_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["report_followup_week_1_due_date"], "2024-03-09");
        assert!(fields["report_followup_week_4_due_date"].is_null());
    }
}
