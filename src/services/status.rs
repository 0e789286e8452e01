//! Case status derivation.
//!
//! Status is a pure function of the case, its audit and today's date. The
//! `status` column only caches the latest result for filtering.

use chrono::NaiveDate;

use crate::entity::{audit, case};
use crate::models::{CaseStatus, EnforcementBodyClosedCase, ReportApprovedStatus};

/// Derive the status of `case`. Rules are evaluated in order; first match wins.
pub fn derive_status(case: &case::Model, audit: Option<&audit::Model>, today: NaiveDate) -> CaseStatus {
    if case.is_deleted {
        return CaseStatus::Deleted;
    }
    if case.is_deactivated {
        return CaseStatus::Deactivated;
    }
    if case.auditor_id.is_none() {
        return CaseStatus::UnassignedCase;
    }
    if case.no_psb_contact && case.enforcement_body_closed_case != EnforcementBodyClosedCase::Yes {
        return CaseStatus::CaseClosedWaitingToBeSent;
    }

    if case.case_close_complete_date.is_none() {
        return open_case_status(case, audit, today);
    }

    if case.sent_to_enforcement_body_sent_date.is_none() {
        return CaseStatus::CaseClosedWaitingToBeSent;
    }
    match case.enforcement_body_closed_case {
        EnforcementBodyClosedCase::No => CaseStatus::CaseClosedSentToEqualitiesBody,
        EnforcementBodyClosedCase::InProgress => CaseStatus::InCorrespondenceWithEqualitiesBody,
        EnforcementBodyClosedCase::Yes => CaseStatus::Complete,
    }
}

fn open_case_status(case: &case::Model, audit: Option<&audit::Model>, today: NaiveDate) -> CaseStatus {
    if audit.is_some_and(|audit| audit.audit_pages_complete_date.is_none()) {
        return CaseStatus::TestInProgress;
    }
    if !case.report_ready_for_qa.is_yes() {
        return CaseStatus::ReportInProgress;
    }
    if case.report_approved_status != ReportApprovedStatus::Approved {
        return CaseStatus::QaInProgress;
    }
    if case.report_sent_date.is_none() {
        return CaseStatus::ReportReadyToSend;
    }
    if case.report_acknowledged_date.is_none() {
        return CaseStatus::InReportCorrespondence;
    }
    if case.twelve_week_update_requested_date.is_none()
        && case
            .report_followup_week_12_due_date
            .is_some_and(|due| today < due)
    {
        return CaseStatus::AwaitingTwelveWeekDeadline;
    }
    if case.twelve_week_correspondence_acknowledged_date.is_none() {
        return CaseStatus::AfterTwelveWeekCorrespondence;
    }
    if !case.is_ready_for_final_decision.is_yes() {
        return CaseStatus::ReviewingChanges;
    }
    CaseStatus::FinalDecisionDue
}

/// User-facing message for a status transition.
pub fn transition_message(old: CaseStatus, new: CaseStatus) -> String {
    format!("Status changed from '{}' to '{}'", old.label(), new.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::YesNo;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assigned_case() -> case::Model {
        case::Model {
            id: 1,
            auditor_id: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_unassigned_case() {
        let case = case::Model::default();
        assert_eq!(derive_status(&case, None, date(2024, 1, 1)), CaseStatus::UnassignedCase);
    }

    #[test]
    fn test_deleted_and_deactivated_take_precedence() {
        let mut case = assigned_case();
        case.is_deactivated = true;
        assert_eq!(derive_status(&case, None, date(2024, 1, 1)), CaseStatus::Deactivated);
        case.is_deleted = true;
        assert_eq!(derive_status(&case, None, date(2024, 1, 1)), CaseStatus::Deleted);
    }

    #[test]
    fn test_audit_progression() {
        let today = date(2024, 1, 1);
        let case = assigned_case();
        let mut audit = audit::Model::default();
        assert_eq!(derive_status(&case, Some(&audit), today), CaseStatus::TestInProgress);

        audit.audit_pages_complete_date = Some(today);
        assert_eq!(derive_status(&case, Some(&audit), today), CaseStatus::ReportInProgress);

        let case = case::Model {
            report_ready_for_qa: YesNo::Yes,
            ..case
        };
        assert_eq!(derive_status(&case, Some(&audit), today), CaseStatus::QaInProgress);

        let case = case::Model {
            report_approved_status: ReportApprovedStatus::Approved,
            ..case
        };
        assert_eq!(derive_status(&case, Some(&audit), today), CaseStatus::ReportReadyToSend);
    }

    #[test]
    fn test_correspondence_progression_depends_on_today() {
        let case = case::Model {
            report_ready_for_qa: YesNo::Yes,
            report_approved_status: ReportApprovedStatus::Approved,
            report_sent_date: Some(date(2024, 3, 1)),
            report_acknowledged_date: Some(date(2024, 3, 4)),
            report_followup_week_12_due_date: Some(date(2024, 5, 24)),
            ..assigned_case()
        };
        assert_eq!(
            derive_status(&case, None, date(2024, 5, 23)),
            CaseStatus::AwaitingTwelveWeekDeadline
        );
        assert_eq!(
            derive_status(&case, None, date(2024, 5, 24)),
            CaseStatus::AfterTwelveWeekCorrespondence
        );

        let case = case::Model {
            twelve_week_correspondence_acknowledged_date: Some(date(2024, 6, 1)),
            ..case
        };
        assert_eq!(derive_status(&case, None, date(2024, 6, 2)), CaseStatus::ReviewingChanges);

        let case = case::Model {
            is_ready_for_final_decision: YesNo::Yes,
            ..case
        };
        assert_eq!(derive_status(&case, None, date(2024, 6, 2)), CaseStatus::FinalDecisionDue);
    }

    #[test]
    fn test_closed_case_equality_body_states() {
        let today = date(2024, 9, 1);
        let mut case = case::Model {
            case_close_complete_date: Some(today),
            ..assigned_case()
        };
        assert_eq!(derive_status(&case, None, today), CaseStatus::CaseClosedWaitingToBeSent);

        case.sent_to_enforcement_body_sent_date = Some(today);
        assert_eq!(
            derive_status(&case, None, today),
            CaseStatus::CaseClosedSentToEqualitiesBody
        );

        case.enforcement_body_closed_case = EnforcementBodyClosedCase::InProgress;
        assert_eq!(
            derive_status(&case, None, today),
            CaseStatus::InCorrespondenceWithEqualitiesBody
        );

        case.enforcement_body_closed_case = EnforcementBodyClosedCase::Yes;
        assert_eq!(derive_status(&case, None, today), CaseStatus::Complete);
    }

    #[test]
    fn test_no_psb_contact_short_circuits_until_closed() {
        let mut case = case::Model {
            no_psb_contact: true,
            ..assigned_case()
        };
        assert_eq!(
            derive_status(&case, None, date(2024, 1, 1)),
            CaseStatus::CaseClosedWaitingToBeSent
        );

        case.enforcement_body_closed_case = EnforcementBodyClosedCase::Yes;
        assert_eq!(derive_status(&case, None, date(2024, 1, 1)), CaseStatus::ReportInProgress);
    }

    #[test]
    fn test_status_is_stable_under_recomputation() {
        let case = assigned_case();
        let today = date(2024, 1, 1);
        let first = derive_status(&case, None, today);
        assert_eq!(derive_status(&case, None, today), first);
    }
}
