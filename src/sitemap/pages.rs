//! The platform's workflow pages, in navigation order.

use super::tree::{
    ChildSet, GroupType, InstanceClass, PageKind, PlatformPage as Page, PlatformPageGroup as Group,
    Sitemap,
};

fn case_page(name: &'static str, route: &'static str, complete: &'static str) -> Page {
    Page::new(name, route).instance(InstanceClass::Case).complete(complete)
}

fn audit_page(name: &'static str, route: &'static str, complete: &'static str) -> Page {
    Page::new(name, route).instance(InstanceClass::Audit).complete(complete)
}

fn statement_page(name: &'static str, route: &'static str, complete: &'static str) -> Page {
    audit_page(name, route, complete).show("uses_statement_checks")
}

fn legacy_statement_page(name: &'static str, route: &'static str, complete: &'static str) -> Page {
    audit_page(name, route, complete).show("uses_legacy_statement")
}

fn retest_page(name: &'static str, route: &'static str, complete: &'static str) -> Page {
    Page::new(name, route).instance(InstanceClass::Retest).complete(complete)
}

/// Build the full sitemap.
pub fn platform_sitemap() -> Sitemap {
    let groups = vec![
        Group::new(
            "Case details",
            GroupType::CaseNav,
            vec![
                case_page(
                    "Case metadata",
                    "cases-edit-case-metadata",
                    "case_details_complete_date",
                )
                .kind(PageKind::CaseMetadata),
            ],
        ),
        Group::new(
            "Initial WCAG test",
            GroupType::CaseNav,
            vec![
                Page::new("Start test", "audits-audit-create")
                    .instance(InstanceClass::Case)
                    .kwarg("case_id")
                    .show("has_no_audit"),
                audit_page(
                    "Initial test metadata",
                    "audits-edit-audit-metadata",
                    "audit_metadata_complete_date",
                ),
                audit_page(
                    "Add or remove pages",
                    "audits-edit-audit-pages",
                    "audit_pages_complete_date",
                )
                .enumerate(
                    ChildSet::AuditPages,
                    Page::new("{instance.page_title} test", "audits-edit-audit-page-checks")
                        .instance(InstanceClass::Page)
                        .complete("complete_date"),
                ),
                audit_page(
                    "Compliance decision",
                    "audits-edit-website-decision",
                    "audit_website_decision_complete_date",
                ),
                audit_page(
                    "Test summary",
                    "audits-edit-audit-wcag-summary",
                    "audit_wcag_summary_complete_date",
                ),
            ],
        ),
        Group::new(
            "Initial statement",
            GroupType::CaseNav,
            vec![
                statement_page(
                    "Statement links",
                    "audits-edit-statement-overview",
                    "audit_statement_overview_complete_date",
                ),
                statement_page(
                    "Statement information",
                    "audits-edit-statement-website",
                    "audit_statement_website_complete_date",
                ),
                statement_page(
                    "Compliance status",
                    "audits-edit-statement-compliance",
                    "audit_statement_compliance_complete_date",
                ),
                statement_page(
                    "Non-accessible content",
                    "audits-edit-statement-non-accessible",
                    "audit_statement_non_accessible_complete_date",
                ),
                statement_page(
                    "Preparation",
                    "audits-edit-statement-preparation",
                    "audit_statement_preparation_complete_date",
                ),
                statement_page(
                    "Feedback and enforcement procedure",
                    "audits-edit-statement-feedback",
                    "audit_statement_feedback_complete_date",
                ),
                statement_page(
                    "Custom statement issues",
                    "audits-edit-statement-custom",
                    "audit_statement_custom_complete_date",
                ),
                legacy_statement_page(
                    "Accessibility statement Pt. 1",
                    "audits-edit-audit-statement-1",
                    "archive_audit_statement_1_complete_date",
                ),
                legacy_statement_page(
                    "Accessibility statement Pt. 2",
                    "audits-edit-audit-statement-2",
                    "archive_audit_statement_2_complete_date",
                ),
                audit_page(
                    "Disproportionate burden",
                    "audits-edit-audit-disproportionate-burden",
                    "audit_disproportionate_burden_complete_date",
                ),
                audit_page(
                    "Statement compliance decision",
                    "audits-edit-statement-decision",
                    "audit_statement_decision_complete_date",
                ),
                statement_page(
                    "Statement summary",
                    "audits-edit-statement-summary",
                    "audit_statement_summary_complete_date",
                ),
            ],
        ),
        Group::new(
            "Report",
            GroupType::CaseNav,
            vec![
                case_page(
                    "Report ready for QA",
                    "cases-edit-report-ready-for-qa",
                    "reporting_details_complete_date",
                ),
                case_page("QA auditor", "cases-edit-qa-auditor", "qa_auditor_complete_date"),
                case_page("QA approval", "cases-edit-qa-approval", "qa_approval_complete_date"),
                case_page(
                    "Publish report",
                    "cases-edit-publish-report",
                    "publish_report_complete_date",
                ),
            ],
        ),
        Group::new(
            "Correspondence",
            GroupType::CaseNav,
            vec![
                case_page(
                    "Manage contact details",
                    "cases-manage-contact-details",
                    "manage_contact_details_complete_date",
                )
                .enumerate(
                    ChildSet::Contacts,
                    Page::new("Edit contact {instance.name}", "cases-edit-contact")
                        .instance(InstanceClass::Contact)
                        .only_when_current(),
                ),
                case_page(
                    "Request contact details",
                    "cases-edit-request-contact-details",
                    "request_contact_details_complete_date",
                )
                .show("has_no_contacts"),
                case_page(
                    "One-week follow-up",
                    "cases-edit-one-week-contact-details",
                    "one_week_contact_details_complete_date",
                )
                .show("has_no_contacts"),
                case_page(
                    "Four-week follow-up",
                    "cases-edit-four-week-contact-details",
                    "four_week_contact_details_complete_date",
                )
                .show("has_no_contacts"),
                case_page(
                    "Report sent on",
                    "cases-edit-report-sent-on",
                    "report_sent_on_complete_date",
                ),
                case_page(
                    "One-week follow-up for report",
                    "cases-edit-one-week-followup",
                    "one_week_followup_complete_date",
                ),
                case_page(
                    "Four-week follow-up for report",
                    "cases-edit-four-week-followup",
                    "four_week_followup_complete_date",
                ),
                case_page(
                    "Report acknowledged",
                    "cases-edit-report-acknowledged",
                    "report_acknowledged_complete_date",
                ),
                case_page(
                    "12-week update request",
                    "cases-edit-12-week-update-requested",
                    "twelve_week_update_requested_complete_date",
                ),
                case_page(
                    "One-week follow-up for final update",
                    "cases-edit-one-week-followup-final",
                    "one_week_followup_final_complete_date",
                ),
                case_page(
                    "12-week update acknowledged",
                    "cases-edit-12-week-update-acknowledged",
                    "twelve_week_update_acknowledged_complete_date",
                ),
            ],
        ),
        Group::new(
            "12-week WCAG test",
            GroupType::CaseNav,
            vec![
                audit_page(
                    "12-week retest metadata",
                    "audits-edit-audit-retest-metadata",
                    "audit_retest_metadata_complete_date",
                ),
                audit_page(
                    "Update page links",
                    "audits-edit-audit-retest-pages",
                    "audit_retest_pages_complete_date",
                )
                .enumerate(
                    ChildSet::AuditRetestPages,
                    Page::new(
                        "{instance.page_title} retest",
                        "audits-edit-audit-retest-page-checks",
                    )
                    .instance(InstanceClass::Page)
                    .complete("retest_complete_date"),
                ),
                audit_page(
                    "Compliance decision",
                    "audits-edit-audit-retest-website-decision",
                    "audit_retest_website_decision_complete_date",
                ),
                audit_page(
                    "Summary of changes",
                    "audits-edit-audit-retest-wcag-summary",
                    "audit_retest_wcag_summary_complete_date",
                ),
            ],
        ),
        Group::new(
            "12-week statement",
            GroupType::CaseNav,
            vec![
                statement_page(
                    "Statement overview",
                    "audits-edit-retest-statement-overview",
                    "audit_retest_statement_overview_complete_date",
                ),
                statement_page(
                    "Custom statement issues",
                    "audits-edit-retest-statement-custom",
                    "audit_retest_statement_custom_complete_date",
                ),
                audit_page(
                    "Statement decision",
                    "audits-edit-retest-statement-decision",
                    "audit_retest_statement_decision_complete_date",
                ),
            ],
        ),
        Group::new(
            "Closing the case",
            GroupType::CaseNav,
            vec![
                case_page(
                    "Reviewing changes",
                    "cases-edit-review-changes",
                    "review_changes_complete_date",
                ),
                case_page(
                    "Recommendation",
                    "cases-edit-enforcement-recommendation",
                    "enforcement_recommendation_complete_date",
                ),
                case_page(
                    "Closing the case",
                    "cases-edit-case-close",
                    "case_close_complete_date",
                ),
            ],
        ),
        Group::new(
            "Post case",
            GroupType::CaseNav,
            vec![
                case_page(
                    "Equality body metadata",
                    "cases-edit-equality-body-metadata",
                    "enforcement_correspondence_complete_date",
                ),
                Page::new(
                    "Equality body correspondence",
                    "cases-list-equality-body-correspondence",
                )
                .instance(InstanceClass::Case)
                .enumerate(
                    ChildSet::EqualityBodyCorrespondence,
                    Page::new(
                        "Edit {instance.correspondence_type} #{instance.id_within_case}",
                        "cases-edit-equality-body-correspondence",
                    )
                    .instance(InstanceClass::EqualityBodyCorrespondence)
                    .only_when_current(),
                ),
                Page::new("Retest overview", "cases-retest-overview")
                    .instance(InstanceClass::Case)
                    .enumerate(
                        ChildSet::Retests,
                        Page::new("Retest #{instance.id_within_case}", "retests-retest-metadata")
                            .instance(InstanceClass::Retest),
                    ),
                Page::new("Deactivate case", "cases-deactivate-case")
                    .instance(InstanceClass::Case)
                    .only_when_current(),
            ],
        ),
        Group::new(
            "Equality body retest",
            GroupType::CaseNav,
            vec![
                retest_page(
                    "Retest metadata",
                    "retests-retest-metadata",
                    "retest_metadata_complete_date",
                ),
                retest_page(
                    "Update pages",
                    "retests-retest-pages",
                    "retest_pages_complete_date",
                )
                .enumerate(
                    ChildSet::RetestPages,
                    Page::new("{instance.page_title} retest", "retests-retest-page-checks")
                        .instance(InstanceClass::RetestPage)
                        .complete("complete_date"),
                ),
                retest_page(
                    "Compliance decision",
                    "retests-retest-compliance",
                    "retest_compliance_complete_date",
                ),
                retest_page(
                    "Statement decision",
                    "retests-retest-statement-decision",
                    "retest_statement_decision_complete_date",
                ),
                retest_page(
                    "Comparison",
                    "retests-retest-comparison",
                    "retest_comparison_complete_date",
                ),
            ],
        ),
        Group::new(
            "Previous case",
            GroupType::PreviousCaseNav,
            vec![
                Page::new("View previous case", "cases-previous-case")
                    .instance(InstanceClass::Case)
                    .show("previous_case_url")
                    .kind(PageKind::PreviousCase),
            ],
        ),
        Group::new(
            "New case",
            GroupType::FutureCaseNav,
            vec![Page::new("Create case", "cases-case-create")],
        ),
        Group::new(
            "Platform",
            GroupType::Default,
            vec![
                Page::new("Search cases", "cases-case-list"),
                Page::new("Your tasks", "notifications-task-list"),
                Page::new("WCAG definitions", "common-wcag-definition-list"),
                Page::new("Statement checks", "common-statement-check-list"),
                Page::new("Email templates", "common-email-template-list"),
            ],
        ),
    ];

    Sitemap { groups }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::super::routes;
    use super::*;

    #[test]
    fn test_every_page_route_is_known() {
        let sitemap = platform_sitemap();
        for group in &sitemap.groups {
            for page in group.pages.iter().flat_map(|p| p.walk()) {
                assert!(routes::is_known(page.route_name), "{}", page.route_name);
            }
        }
    }

    #[test]
    fn test_enumerating_pages_have_one_template() {
        let sitemap = platform_sitemap();
        for page in sitemap.groups.iter().flat_map(|g| &g.pages) {
            if let PageKind::Enumerate(_) = page.kind {
                assert_eq!(page.subpages.len(), 1, "{}", page.name);
            }
        }
    }

    #[test]
    fn test_group_names_are_unique() {
        let sitemap = platform_sitemap();
        let names: BTreeSet<_> = sitemap.groups.iter().map(|g| g.name).collect();
        assert_eq!(names.len(), sitemap.groups.len());
    }
}
