//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::config::USER_ID_HEADER;
use crate::{api, error, models, services, sitemap};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Accessibility Monitoring Platform",
        version = "0.1.0",
        description = "Case management API for monitoring public sector website accessibility: cases, WCAG tests, reports, correspondence and equality-body retests"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Case endpoints
        api::cases::list_cases,
        api::cases::create_case,
        api::cases::get_case,
        api::cases::update_case,
        api::cases::delete_case,
        api::cases::override_due_dates,
        api::cases::deactivate_case,
        api::cases::reactivate_case,
        api::cases::case_history,
        api::cases::case_events,
        api::cases::case_status,
        api::cases::case_overdue,
        // Audit endpoints
        api::audits::create_audit,
        api::audits::get_audit,
        api::audits::update_audit,
        api::audits::add_page,
        api::audits::update_page,
        api::audits::delete_page,
        api::audits::update_page_check_results,
        api::audits::update_page_retest,
        api::audits::mark_page_missing,
        api::audits::update_statement_check_results,
        api::audits::add_custom_statement_issue,
        api::audits::report_freshness,
        // Report endpoints
        api::reports::generate_report,
        api::reports::get_report,
        api::reports::preview_report,
        api::reports::publish_report,
        api::reports::list_published_reports,
        api::reports::set_section_override,
        api::reports::delete_table_row,
        api::reports::view_published_report,
        // Contact and correspondence endpoints
        api::contacts::list_contacts,
        api::contacts::create_contact,
        api::contacts::update_contact,
        api::contacts::delete_contact,
        api::contacts::list_zendesk_tickets,
        api::contacts::create_zendesk_ticket,
        api::contacts::update_zendesk_ticket,
        api::contacts::list_correspondence,
        api::contacts::create_correspondence,
        api::contacts::update_correspondence,
        api::contacts::toggle_correspondence_status,
        // Comment endpoints
        api::comments::list_comments,
        api::comments::create_comment,
        api::comments::edit_comment,
        api::comments::delete_comment,
        // Task endpoints
        api::tasks::list_tasks,
        api::tasks::mark_task_read,
        api::tasks::set_reminder,
        api::tasks::delete_reminder,
        api::tasks::get_email_notifications,
        api::tasks::set_email_notifications,
        api::tasks::list_users,
        api::tasks::get_platform,
        api::tasks::set_active_qa_auditor,
        // Retest endpoints
        api::retests::list_retests,
        api::retests::start_retest,
        api::retests::get_retest,
        api::retests::update_retest,
        api::retests::decide_retest,
        api::retests::update_retest_page,
        // Export endpoints
        api::exports::export_cases,
        api::exports::export_closed_cases,
        api::exports::required_data_missing,
        api::exports::render_email,
        // Catalogue endpoints
        api::catalogues::list_wcag_definitions,
        api::catalogues::create_wcag_definition,
        api::catalogues::end_wcag_definition,
        api::catalogues::list_statement_checks,
        api::catalogues::create_statement_check,
        api::catalogues::end_statement_check,
        api::catalogues::list_email_templates,
        api::catalogues::create_email_template,
        api::catalogues::list_sectors,
        api::catalogues::create_sector,
        api::catalogues::list_sub_categories,
        api::catalogues::list_base_templates,
        // Navigation
        api::sitemap::get_sitemap,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            api::VersionBody,
            models::VersionedUpdate,
            models::Pagination,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Cases
            models::CaseVariant,
            models::CaseStatus,
            models::EnforcementBody,
            models::PsbLocation,
            models::YesNo,
            models::ReportApprovedStatus,
            models::EnforcementBodyClosedCase,
            models::RecommendationForEnforcement,
            models::CaseEventType,
            models::case::CreateCaseRequest,
            models::case::CaseSummary,
            models::case::DueDateOverride,
            models::case::DeactivateCaseRequest,
            models::case::CaseHistoryEntry,
            api::cases::CaseListResponse,
            services::scheduler::OverdueItem,
            // Audits
            models::PageType,
            models::WcagType,
            models::CheckResultState,
            models::RetestState,
            models::StatementCheckType,
            models::StatementCheckResultState,
            models::WebsiteComplianceState,
            models::StatementComplianceState,
            models::DisproportionateBurden,
            models::ExemptionsState,
            models::AccessibilityStatementState,
            models::audit::CreateAuditRequest,
            models::audit::CreatePageRequest,
            models::audit::CheckResultInput,
            models::audit::PageCheckResultsRequest,
            models::audit::RetestCheckResultInput,
            models::audit::PageRetestRequest,
            models::audit::StatementCheckResultInput,
            models::audit::PageMissingRequest,
            models::audit::CreateCustomStatementIssueRequest,
            models::audit::ReportFreshness,
            // Reports
            models::TemplateType,
            models::report::SectionOverrideRequest,
            models::report::PublishedReportSummary,
            models::report::PublishResponse,
            // Contacts and correspondence
            models::ContactPreferred,
            models::CorrespondenceType,
            models::CorrespondenceStatus,
            models::contact::CreateContactRequest,
            models::contact::CreateCommentRequest,
            models::contact::EditCommentRequest,
            models::contact::CreateZendeskTicketRequest,
            models::contact::CreateCorrespondenceRequest,
            // Tasks
            models::TaskType,
            models::task::ReminderRequest,
            api::tasks::EmailNotificationsRequest,
            api::tasks::EmailNotificationsResponse,
            api::tasks::ActiveQaAuditorRequest,
            // Retests
            models::RetestComplianceState,
            models::retest::StartRetestRequest,
            models::retest::RetestCheckResultUpdate,
            models::retest::RetestPageUpdate,
            models::retest::RetestDecision,
            // Exports
            services::equality_body_export::RequiredDataMissing,
            services::email_templates::RenderedEmail,
            // Catalogues
            models::EmailTemplateType,
            models::catalogue::CreateWcagDefinitionRequest,
            models::catalogue::CreateStatementCheckRequest,
            models::catalogue::EndCatalogueEntryRequest,
            models::catalogue::CreateEmailTemplateRequest,
            api::catalogues::CreateSectorRequest,
            // Navigation
            sitemap::GroupType,
            sitemap::HydratedSitemap,
            sitemap::HydratedGroup,
            sitemap::HydratedPage,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Cases", description = "Case lifecycle, due dates and history"),
        (name = "Audits", description = "Initial and 12-week WCAG tests and statement checks"),
        (name = "Reports", description = "Report generation, QA and publication"),
        (name = "Contacts", description = "Contacts, Zendesk tickets and equality-body correspondence"),
        (name = "Comments", description = "QA comments"),
        (name = "Tasks", description = "Tasks, reminders, users and notification settings"),
        (name = "Retests", description = "Equality-body retests"),
        (name = "Exports", description = "Equality-body CSV exports and email templates"),
        (name = "Catalogues", description = "Reference catalogues"),
        (name = "Sitemap", description = "Workflow navigation")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Declare the acting-user header set by the upstream proxy.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(USER_ID_HEADER),
                    ),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_workflow_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/cases"));
        assert!(doc.paths.paths.contains_key("/api/v1/sitemap"));
        assert!(doc.paths.paths.contains_key("/api/v1/retests/{id}"));
    }
}
