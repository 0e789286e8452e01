//! Reference catalogue DTOs.

use chrono::NaiveDate;
use sea_orm::sea_query::StringLen;
use serde::Deserialize;
use utoipa::ToSchema;

use super::{StatementCheckType, WcagType};

choice_enum! {
    /// Correspondence stage an email template belongs to.
    pub enum EmailTemplateType {
        Generic => "generic", "Generic",
        ReportFollowup => "report-followup", "Report follow-up",
        NoContactChaser => "no-contact-chaser", "No contact chaser",
        TwelveWeekRequest => "12-week-request", "12-week update request",
        EqualityBody => "equality-body", "Equality body",
    }
}

/// Half-open validity window `[date_start, date_end)` shared by catalogue rows.
pub fn in_validity_window(
    date_start: Option<NaiveDate>,
    date_end: Option<NaiveDate>,
    on: NaiveDate,
) -> bool {
    date_start.is_none_or(|start| start <= on) && date_end.is_none_or(|end| on < end)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateWcagDefinitionRequest {
    #[serde(rename = "type")]
    pub wcag_type: WcagType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url_on_w3: String,
    #[serde(default)]
    pub report_boilerplate: String,
    pub date_start: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateStatementCheckRequest {
    #[serde(rename = "type")]
    pub check_type: StatementCheckType,
    pub label: String,
    #[serde(default)]
    pub success_criteria: String,
    #[serde(default)]
    pub report_text: String,
    pub position: Option<i32>,
    pub date_start: Option<NaiveDate>,
}

/// Retire a catalogue entry from a given date (exclusive end of window).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EndCatalogueEntryRequest {
    pub date_end: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateEmailTemplateRequest {
    pub name: String,
    #[serde(rename = "type", default)]
    pub template_type: EmailTemplateType,
    pub subject: String,
    pub content: String,
    pub date_start: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validity_window_is_half_open() {
        let start = Some(date(2023, 1, 1));
        let end = Some(date(2024, 1, 1));

        assert!(!in_validity_window(start, end, date(2022, 12, 31)));
        assert!(in_validity_window(start, end, date(2023, 1, 1)));
        assert!(in_validity_window(start, end, date(2023, 12, 31)));
        assert!(!in_validity_window(start, end, date(2024, 1, 1)));
    }

    #[test]
    fn test_open_window_bounds() {
        assert!(in_validity_window(None, None, date(1999, 1, 1)));
        assert!(in_validity_window(None, Some(date(2024, 1, 1)), date(2020, 6, 1)));
        assert!(!in_validity_window(Some(date(2024, 1, 1)), None, date(2020, 6, 1)));
    }
}
