//! Domain models, choice enums and request/response DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Declares a string-backed choice enum shared by the database layer, the
/// JSON API and the OpenAPI schema.
///
/// Each variant carries its stored value and a human readable label. The
/// first variant is the default.
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal, $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
            sea_orm::EnumIter,
            sea_orm::DeriveActiveEnum,
            utoipa::ToSchema,
        )]
        #[sea_orm(rs_type = "String", db_type = "String(StringLen::N(64))")]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[sea_orm(string_value = $value)]
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            /// Human readable label used in reports, exports and messages.
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

pub mod audit;
pub mod audit_data;
pub mod case;
pub mod catalogue;
pub mod contact;
pub mod history;
pub mod report;
pub mod retest;
pub mod task;

pub use audit::{
    AccessibilityStatementState, CheckResultState, DisproportionateBurden, ExemptionsState,
    PageType, RetestState, StatementCheckResultState, StatementCheckType,
    StatementComplianceState, WcagType, WebsiteComplianceState,
};
pub use audit_data::AuditData;
pub use case::{
    CaseEventType, CaseHistoryEntry, CaseListQuery, CaseStatus, CaseSummary, CaseVariant,
    CreateCaseRequest, DeactivateCaseRequest, DueDateOverride, EnforcementBody,
    EnforcementBodyClosedCase, PsbLocation, RecommendationForEnforcement, ReportApprovedStatus,
    YesNo,
};
pub use catalogue::EmailTemplateType;
pub use contact::{ContactPreferred, CorrespondenceStatus, CorrespondenceType};
pub use history::{EntityRef, EntityType, HistoryEventType};
pub use report::{PublishedReportSummary, REPORT_VERSION, TemplateType};
pub use retest::RetestComplianceState;
pub use task::TaskType;

/// Body of every versioned partial update.
///
/// `version` is the version the client read; `fields` holds the changed
/// attributes keyed by field name.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VersionedUpdate {
    pub version: i32,
    #[schema(value_type = Object)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of a versioned save returned to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome<T> {
    pub instance: T,
    /// Whether anything was written.
    pub changed: bool,
    /// Informational messages raised by the save (e.g. status transitions).
    pub messages: Vec<String>,
    /// URL of the next platform page, when the save came from a workflow page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_url: Option<String>,
}

/// Pagination parameters.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    100
}

impl PaginationParams {
    /// Calculate the offset for database queries.
    pub fn offset(&self) -> u32 {
        let page = self.page.unwrap_or(default_page());
        let limit = self.limit.unwrap_or(default_limit());
        (page.saturating_sub(1)) * limit
    }

    /// Clamp limit to maximum allowed value.
    pub fn clamped_limit(&self) -> u32 {
        self.limit.unwrap_or(default_limit()).clamp(1, 100)
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(default_page()).max(1)
    }
}

/// Pagination metadata for responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    /// Create pagination metadata.
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            ((total as f64) / (limit as f64)).ceil() as u32
        };

        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }
}
