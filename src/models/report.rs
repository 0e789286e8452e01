//! Report enums and DTOs.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Template generation of the report content. Part of every published key.
pub const REPORT_VERSION: &str = "v1_1_0__20240401";

choice_enum! {
    pub enum TemplateType {
        Markdown => "markdown", "Markdown",
        Html => "html", "HTML",
        UrlsTable => "urls-table", "Contains URL table",
        IssuesTable => "issues-table", "Contains issues table",
    }
}

impl TemplateType {
    pub fn has_table(&self) -> bool {
        matches!(self, Self::UrlsTable | Self::IssuesTable)
    }
}

/// Per-section content override.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SectionOverrideRequest {
    /// `None` removes the override and restores the generated content.
    pub content: Option<String>,
}

/// Published report listing entry (without the HTML body).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublishedReportSummary {
    pub id: i32,
    pub case_id: i32,
    pub version: i32,
    pub guid: String,
    pub report_version: String,
    pub latest_published: bool,
    pub key: String,
    pub created: DateTime<Utc>,
    pub created_by_id: Option<i32>,
}

/// Publish endpoint result.
///
/// A case without QA approval gets a guard response instead of an error.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublishResponse {
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PublishedReportSummary>,
}
