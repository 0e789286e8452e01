//! Audit choice enums and DTOs.

use chrono::NaiveDate;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

choice_enum! {
    /// Page type. Declaration order is the page order used in tests and reports.
    pub enum PageType {
        Home => "home", "Home page",
        Contact => "contact", "Contact page",
        Statement => "statement", "Accessibility statement",
        Coronavirus => "coronavirus", "Coronavirus page",
        Pdf => "pdf", "PDF",
        Form => "form", "Form",
        Extra => "extra", "Page",
        Corporate => "corporate", "Corporate page",
        Additional => "additional", "Additional page",
    }
}

impl PageType {
    /// Sort key for page ordering.
    pub fn position(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(Self::ALL.len())
    }

    /// Page types created automatically with every new audit.
    pub fn mandatory() -> &'static [PageType] {
        &[
            Self::Home,
            Self::Contact,
            Self::Statement,
            Self::Coronavirus,
            Self::Pdf,
            Self::Form,
        ]
    }
}

choice_enum! {
    pub enum WcagType {
        Manual => "manual", "Manual",
        Axe => "axe", "Axe",
        Pdf => "pdf", "PDF",
    }
}

choice_enum! {
    pub enum CheckResultState {
        NotTested => "not-tested", "Not tested",
        Error => "error", "Error found",
        NoError => "no-error", "No issue",
    }
}

choice_enum! {
    pub enum RetestState {
        NotRetested => "not-retested", "Not retested",
        Fixed => "fixed", "Fixed",
        NotFixed => "not-fixed", "Not fixed",
    }
}

choice_enum! {
    /// Accessibility statement check groups, in review order.
    pub enum StatementCheckType {
        Overview => "overview", "Statement overview",
        Website => "website", "Statement information",
        Compliance => "compliance", "Compliance status",
        NonAccessible => "non-accessible", "Non-accessible content",
        Preparation => "preparation", "Statement preparation",
        Feedback => "feedback", "Feedback and enforcement procedure",
        Custom => "custom", "Custom issues",
    }
}

choice_enum! {
    pub enum StatementCheckResultState {
        NotTested => "not-tested", "Not tested",
        Yes => "yes", "Yes",
        No => "no", "No",
    }
}

choice_enum! {
    pub enum WebsiteComplianceState {
        NotKnown => "not-known", "Not known",
        Compliant => "compliant", "Fully compliant",
        PartiallyCompliant => "partially-compliant", "Partially compliant",
    }
}

choice_enum! {
    pub enum StatementComplianceState {
        Unknown => "unknown", "Not selected",
        Compliant => "compliant", "Compliant",
        NotCompliant => "not-compliant", "Not compliant or no statement",
        NoStatement => "no-statement", "No statement",
    }
}

choice_enum! {
    pub enum DisproportionateBurden {
        NotKnown => "not-known", "Not known",
        NoClaim => "no-claim", "No claim",
        NoAssessment => "no-assessment", "Claim with no assessment",
        Assessment => "assessment", "Claim with assessment",
    }
}

choice_enum! {
    pub enum ExemptionsState {
        Unknown => "unknown", "Unknown",
        NoExemptions => "no", "No exemptions",
        Exemptions => "yes", "Exemptions",
    }
}

choice_enum! {
    /// Overall accessibility statement state (also used by the legacy regime).
    pub enum AccessibilityStatementState {
        NotFound => "not-found", "Not found",
        Found => "found", "Found",
        FoundButIncomplete => "found-but", "Found but incomplete",
    }
}

/// Request to create the initial audit for a case.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAuditRequest {
    /// Date of the test; the WCAG catalogue window is evaluated against it.
    pub date_of_test: NaiveDate,
    /// When absent the regime is chosen from the date of test.
    pub uses_statement_checks: Option<bool>,
}

/// Request to add a page to an audit.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePageRequest {
    #[serde(default = "default_page_type")]
    pub page_type: PageType,
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub location: String,
}

fn default_page_type() -> PageType {
    PageType::Extra
}

/// Initial test outcome for one WCAG definition on one page.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckResultInput {
    pub wcag_definition_id: i32,
    /// Version of the result as read by the client, 0 when none existed yet.
    pub version: i32,
    pub check_result_state: CheckResultState,
    #[serde(default)]
    pub notes: String,
}

/// Bulk check-result update for a page.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PageCheckResultsRequest {
    pub results: Vec<CheckResultInput>,
    /// Marks the page test complete when set.
    pub complete_date: Option<NaiveDate>,
}

/// Retest outcome for one check result.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RetestCheckResultInput {
    pub check_result_id: i32,
    pub version: i32,
    pub retest_state: RetestState,
    #[serde(default)]
    pub retest_notes: String,
}

/// Bulk retest update for a page.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PageRetestRequest {
    pub results: Vec<RetestCheckResultInput>,
    pub retest_complete_date: Option<NaiveDate>,
}

/// Statement check result update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StatementCheckResultInput {
    pub statement_check_result_id: i32,
    pub version: i32,
    pub check_result_state: Option<StatementCheckResultState>,
    pub report_comment: Option<String>,
    pub retest_state: Option<StatementCheckResultState>,
    pub retest_comment: Option<String>,
}

/// Mark a page as missing at the 12-week retest.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PageMissingRequest {
    pub version: i32,
    /// `None` clears the marking.
    pub missing_date: Option<NaiveDate>,
}

/// Custom statement issue raised by the auditor.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCustomStatementIssueRequest {
    pub report_comment: String,
}

/// Report freshness flags.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportFreshness {
    /// Audit data changed after the draft report was last rebuilt.
    pub draft_out_of_date: bool,
    /// Audit data changed after the latest report was published.
    pub published_out_of_date: bool,
}
