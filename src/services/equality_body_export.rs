//! CSV export of closed cases for the equality bodies.
//!
//! Columns are data: each names the record it reads from, the attribute,
//! whether the equality body requires it and how the value is rendered.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::entity::{audit, case, contact, retest};
use crate::error::{AppError, AppResult};
use crate::models::{
    CaseStatus, DisproportionateBurden, EnforcementBody, PsbLocation,
    RecommendationForEnforcement, RetestComplianceState, StatementComplianceState,
    WebsiteComplianceState, YesNo,
};
use crate::services::contacts::primary_contact;

/// Record a column reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceClass {
    Case,
    Audit,
    Contact,
    /// Latest equality-body retest of the case.
    Retest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    String,
    /// ISO date rendered as `dd/mm/yyyy`.
    Date,
    Url,
    Markdown,
    Pre,
}

#[derive(Debug, Clone, Copy)]
pub struct EqualityBodyCsvColumn {
    pub header: &'static str,
    pub source_class: SourceClass,
    pub source_attr: &'static str,
    pub required: bool,
    pub data_type: DataType,
    pub default: Option<&'static str>,
}

const fn column(
    header: &'static str,
    source_class: SourceClass,
    source_attr: &'static str,
    required: bool,
    data_type: DataType,
) -> EqualityBodyCsvColumn {
    EqualityBodyCsvColumn {
        header,
        source_class,
        source_attr,
        required,
        data_type,
        default: None,
    }
}

pub const EQUALITY_BODY_COLUMNS: &[EqualityBodyCsvColumn] = &[
    column("Equality body", SourceClass::Case, "enforcement_body", true, DataType::String),
    column("Case number", SourceClass::Case, "case_identifier", true, DataType::String),
    column("Organisation", SourceClass::Case, "organisation_name", true, DataType::String),
    column("Website URL", SourceClass::Case, "home_page_url", true, DataType::Url),
    column("Website name", SourceClass::Case, "website_name", false, DataType::String),
    column("Public sector body location", SourceClass::Case, "psb_location", false, DataType::String),
    column("Previous case URL", SourceClass::Case, "previous_case_url", false, DataType::Url),
    column("Is it a complaint?", SourceClass::Case, "is_complaint", false, DataType::String),
    column("Date when website was tested", SourceClass::Audit, "date_of_test", true, DataType::Date),
    column("Date report sent", SourceClass::Case, "report_sent_date", true, DataType::Date),
    column("Date report acknowledged", SourceClass::Case, "report_acknowledged_date", false, DataType::Date),
    column("12-week update requested", SourceClass::Case, "twelve_week_update_requested_date", false, DataType::Date),
    column("Date of retest", SourceClass::Audit, "retest_date", true, DataType::Date),
    column("Initial website compliance decision", SourceClass::Audit, "website_compliance_state", true, DataType::String),
    column("Retest website compliance decision", SourceClass::Audit, "retest_website_compliance_state", true, DataType::String),
    column("Initial accessibility statement decision", SourceClass::Audit, "statement_compliance_state", true, DataType::String),
    column("Retest accessibility statement decision", SourceClass::Audit, "retest_statement_compliance_state", true, DataType::String),
    column("Disproportionate burden claimed?", SourceClass::Audit, "disproportionate_burden_claim", false, DataType::String),
    column("Disproportionate burden notes", SourceClass::Audit, "disproportionate_burden_notes", false, DataType::Pre),
    column("Enforcement recommendation", SourceClass::Case, "recommendation_for_enforcement", true, DataType::String),
    column("Enforcement recommendation notes", SourceClass::Case, "recommendation_notes", true, DataType::Markdown),
    column("Date sent to equality body", SourceClass::Case, "sent_to_enforcement_body_sent_date", false, DataType::Date),
    column("Contact name", SourceClass::Contact, "name", false, DataType::String),
    column("Job title", SourceClass::Contact, "job_title", false, DataType::String),
    column("Contact detail", SourceClass::Contact, "contact_details", false, DataType::Pre),
    EqualityBodyCsvColumn {
        header: "Latest retest compliance",
        source_class: SourceClass::Retest,
        source_attr: "retest_compliance_state",
        required: false,
        data_type: DataType::String,
        default: Some("No retest"),
    },
];

/// Records reachable from one exported case.
#[derive(Debug, Clone, Copy)]
pub struct ExportSource<'a> {
    pub case: &'a case::Model,
    pub audit: Option<&'a audit::Model>,
    pub contact: Option<&'a contact::Model>,
    pub retest: Option<&'a retest::Model>,
}

impl ExportSource<'_> {
    fn raw_value(&self, column: &EqualityBodyCsvColumn) -> AppResult<Value> {
        let instance = match column.source_class {
            SourceClass::Case => Some(serde_json::to_value(self.case)?),
            SourceClass::Audit => self.audit.map(serde_json::to_value).transpose()?,
            SourceClass::Contact => self.contact.map(serde_json::to_value).transpose()?,
            SourceClass::Retest => self.retest.map(serde_json::to_value).transpose()?,
        };
        Ok(instance
            .and_then(|v| v.get(column.source_attr).cloned())
            .unwrap_or(Value::Null))
    }
}

/// Label of a stored choice value, for attributes backed by a choice enum.
fn choice_label(attr: &str, value: &str) -> Option<&'static str> {
    match attr {
        "enforcement_body" => EnforcementBody::parse(value).map(|v| v.label()),
        "psb_location" => PsbLocation::parse(value).map(|v| v.label()),
        "is_complaint" => YesNo::parse(value).map(|v| v.label()),
        "recommendation_for_enforcement" => {
            RecommendationForEnforcement::parse(value).map(|v| v.label())
        }
        "website_compliance_state" | "retest_website_compliance_state" => {
            WebsiteComplianceState::parse(value).map(|v| v.label())
        }
        "statement_compliance_state" | "retest_statement_compliance_state" => {
            StatementComplianceState::parse(value).map(|v| v.label())
        }
        "disproportionate_burden_claim" => DisproportionateBurden::parse(value).map(|v| v.label()),
        "retest_compliance_state" => RetestComplianceState::parse(value).map(|v| v.label()),
        _ => None,
    }
}

/// Render a resolved value for its column.
pub fn render_value(column: &EqualityBodyCsvColumn, value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if column.data_type == DataType::Date => {
            match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(date) => date.format("%d/%m/%Y").to_string(),
                Err(_) => s.clone(),
            }
        }
        Value::String(s) => {
            if let Some(label) = choice_label(column.source_attr, s) {
                label.to_string()
            } else {
                s.clone()
            }
        }
        other => other.to_string(),
    };

    let text = match column.data_type {
        DataType::Url => text.trim().to_string(),
        DataType::Pre | DataType::Markdown => text.replace("\r\n", "\n"),
        DataType::String | DataType::Date => text.trim().to_string(),
    };
    if text.is_empty() {
        column.default.unwrap_or_default().to_string()
    } else {
        text
    }
}

/// One exported row and the headers of required columns left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub cells: Vec<String>,
    pub required_data_missing: Vec<&'static str>,
}

pub fn build_row(source: &ExportSource<'_>, columns: &[EqualityBodyCsvColumn]) -> AppResult<ExportRow> {
    let mut cells = Vec::with_capacity(columns.len());
    let mut required_data_missing = Vec::new();
    for column in columns {
        let value = source.raw_value(column)?;
        let rendered = render_value(column, &value);
        let unset = match &value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty() || choice_is_unset(column.source_attr, s),
            _ => false,
        };
        if column.required && unset {
            required_data_missing.push(column.header);
        }
        cells.push(rendered);
    }
    Ok(ExportRow {
        cells,
        required_data_missing,
    })
}

/// Choice values that mean nothing was decided yet.
fn choice_is_unset(attr: &str, value: &str) -> bool {
    match attr {
        "website_compliance_state" | "retest_website_compliance_state" => {
            WebsiteComplianceState::parse(value) == Some(WebsiteComplianceState::default())
        }
        "statement_compliance_state" | "retest_statement_compliance_state" => {
            StatementComplianceState::parse(value) == Some(StatementComplianceState::Unknown)
        }
        "recommendation_for_enforcement" => {
            RecommendationForEnforcement::parse(value)
                == Some(RecommendationForEnforcement::default())
        }
        _ => false,
    }
}

/// Write rows as RFC 4180 CSV with a header row.
pub fn write_csv(columns: &[EqualityBodyCsvColumn], rows: &[ExportRow]) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns.iter().map(|c| c.header))?;
    for row in rows {
        writer.write_record(&row.cells)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::InvalidInput(format!("CSV error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::InvalidInput(format!("CSV error: {}", e)))
}

/// Statuses of cases handed to an equality body.
pub const EXPORTABLE_STATUSES: &[CaseStatus] = &[
    CaseStatus::CaseClosedWaitingToBeSent,
    CaseStatus::CaseClosedSentToEqualitiesBody,
    CaseStatus::InCorrespondenceWithEqualitiesBody,
];

struct LoadedCase {
    case: case::Model,
    audit: Option<audit::Model>,
    contacts: Vec<contact::Model>,
    retest: Option<retest::Model>,
}

impl LoadedCase {
    async fn load(pool: &DbPool, case: case::Model) -> AppResult<Self> {
        let audit = pool.get_audit_for_case(case.id).await?;
        let contacts = pool.list_contacts(case.id).await?;
        let retest = pool
            .list_retests(case.id)
            .await?
            .into_iter()
            .filter(|r| !r.is_original_test())
            .max_by_key(|r| r.id_within_case);
        Ok(Self {
            case,
            audit,
            contacts,
            retest,
        })
    }

    fn source(&self) -> ExportSource<'_> {
        ExportSource {
            case: &self.case,
            audit: self.audit.as_ref(),
            contact: primary_contact(&self.contacts),
            retest: self.retest.as_ref(),
        }
    }
}

/// Export the given cases, in id order.
pub async fn export_cases(pool: &DbPool, case_ids: &[i32]) -> AppResult<String> {
    let mut ids = case_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    let mut rows = Vec::with_capacity(ids.len());
    for id in ids {
        let loaded = LoadedCase::load(pool, pool.get_case(id).await?).await?;
        rows.push(build_row(&loaded.source(), EQUALITY_BODY_COLUMNS)?);
    }
    write_csv(EQUALITY_BODY_COLUMNS, &rows)
}

/// Export every case currently with, or waiting for, an equality body.
pub async fn export_closed_cases(pool: &DbPool) -> AppResult<String> {
    let ids: Vec<i32> = pool
        .list_cases_by_status(EXPORTABLE_STATUSES)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    export_cases(pool, &ids).await
}

/// Required export data still missing for a case.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RequiredDataMissing {
    pub case_id: i32,
    pub columns: Vec<String>,
}

pub async fn required_data_missing(pool: &DbPool, case_id: i32) -> AppResult<RequiredDataMissing> {
    let loaded = LoadedCase::load(pool, pool.get_case(case_id).await?).await?;
    let row = build_row(&loaded.source(), EQUALITY_BODY_COLUMNS)?;
    Ok(RequiredDataMissing {
        case_id,
        columns: row
            .required_data_missing
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_case() -> case::Model {
        case::Model {
            id: 7,
            case_identifier: "#S-7".to_string(),
            organisation_name: "Acme, Council".to_string(),
            home_page_url: " https://acme.example ".to_string(),
            report_sent_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            recommendation_notes: "Line one\r\nLine two".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_value_formats_dates_and_labels() {
        let date_column = column("Date", SourceClass::Case, "report_sent_date", true, DataType::Date);
        assert_eq!(render_value(&date_column, &Value::String("2024-03-01".into())), "01/03/2024");

        let body_column = column("Body", SourceClass::Case, "enforcement_body", true, DataType::String);
        assert_eq!(
            render_value(&body_column, &Value::String("ecni".into())),
            "Equality Commission Northern Ireland"
        );
    }

    #[test]
    fn test_date_like_text_is_left_alone() {
        let notes = column("Notes", SourceClass::Case, "recommendation_notes", true, DataType::Markdown);
        assert_eq!(render_value(&notes, &Value::String("2024-03-01".into())), "2024-03-01");

        let name = column("Contact name", SourceClass::Contact, "name", false, DataType::String);
        assert_eq!(render_value(&name, &Value::String(" 2024-03-01 ".into())), "2024-03-01");

        let sent = EQUALITY_BODY_COLUMNS
            .iter()
            .find(|c| c.header == "Date report sent")
            .unwrap();
        assert_eq!(sent.data_type, DataType::Date);
        assert_eq!(render_value(sent, &Value::String("not a date".into())), "not a date");
    }

    #[test]
    fn test_build_row_reports_missing_required_columns() {
        let case = closed_case();
        let source = ExportSource {
            case: &case,
            audit: None,
            contact: None,
            retest: None,
        };
        let row = build_row(&source, EQUALITY_BODY_COLUMNS).unwrap();

        assert_eq!(row.cells.len(), EQUALITY_BODY_COLUMNS.len());
        assert_eq!(row.cells[3], "https://acme.example");
        assert!(row.required_data_missing.contains(&"Date when website was tested"));
        assert!(row.required_data_missing.contains(&"Enforcement recommendation"));
        assert!(!row.required_data_missing.contains(&"Date report sent"));
        assert_eq!(row.cells.last().map(String::as_str), Some("No retest"));
    }

    #[test]
    fn test_write_csv_quotes_and_is_stable() {
        let case = closed_case();
        let source = ExportSource {
            case: &case,
            audit: None,
            contact: None,
            retest: None,
        };
        let rows = vec![build_row(&source, EQUALITY_BODY_COLUMNS).unwrap()];
        let first = write_csv(EQUALITY_BODY_COLUMNS, &rows).unwrap();
        let second = write_csv(EQUALITY_BODY_COLUMNS, &rows).unwrap();

        assert_eq!(first, second);
        assert!(first.starts_with("Equality body,Case number,Organisation,"));
        assert!(first.contains("\"Acme, Council\""));
        assert!(first.contains("\"Line one\nLine two\""));
    }
}
