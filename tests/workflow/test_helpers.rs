//! Shared fixtures for the workflow tests.

use amp_lib::db::DbPool;
use amp_lib::entity::{audit, case, page, user, wcag_definition};
use amp_lib::models::VersionedUpdate;
use amp_lib::models::audit::{CreateAuditRequest, CreatePageRequest};
use amp_lib::models::CreateCaseRequest;
use amp_lib::models::catalogue::CreateWcagDefinitionRequest;
use amp_lib::models::{EnforcementBody, PageType, WcagType};
use amp_lib::services::{audit as audit_service, case_workflow};
use chrono::NaiveDate;
use serde_json::Value;

/// Fresh in-memory database. One connection, so every query sees the same data.
pub async fn create_test_pool() -> DbPool {
    let pool = DbPool::connect("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory database");
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");
    pool
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn create_user(pool: &DbPool, first_name: &str) -> user::Model {
    pool.create_user(
        first_name,
        "Tester",
        &format!("{}@example.com", first_name.to_lowercase()),
    )
    .await
    .expect("Failed to create user")
}

pub fn case_request(organisation_name: &str, url: &str) -> CreateCaseRequest {
    CreateCaseRequest {
        variant: Default::default(),
        organisation_name: organisation_name.to_string(),
        home_page_url: url.to_string(),
        website_name: String::new(),
        enforcement_body: EnforcementBody::default(),
        psb_location: Default::default(),
        sector_id: None,
        subcategory_id: None,
        is_complaint: Default::default(),
        previous_case_url: String::new(),
        notes: String::new(),
        auditor_id: None,
    }
}

pub async fn create_case(pool: &DbPool, user_id: i32) -> case::Model {
    case_workflow::create_case(pool, user_id, case_request("Acme", "https://acme.example"))
        .await
        .expect("Failed to create case")
}

/// Build a partial update body from a JSON object.
pub fn patch(version: i32, fields: Value) -> VersionedUpdate {
    VersionedUpdate {
        version,
        fields: fields.as_object().cloned().unwrap_or_default(),
    }
}

pub async fn create_audit(pool: &DbPool, user_id: i32, case_id: i32) -> audit::Model {
    audit_service::create_audit(
        pool,
        user_id,
        case_id,
        &CreateAuditRequest {
            date_of_test: date(2024, 6, 3),
            uses_statement_checks: Some(true),
        },
    )
    .await
    .expect("Failed to create audit")
}

pub async fn create_wcag(pool: &DbPool, name: &str, boilerplate: &str) -> wcag_definition::Model {
    pool.create_wcag_definition(&CreateWcagDefinitionRequest {
        wcag_type: WcagType::Manual,
        name: name.to_string(),
        description: String::new(),
        url_on_w3: String::new(),
        report_boilerplate: boilerplate.to_string(),
        date_start: Some(date(2020, 1, 1)),
    })
    .await
    .expect("Failed to create WCAG definition")
}

pub async fn add_page(
    pool: &DbPool,
    user_id: i32,
    audit_id: i32,
    name: &str,
    url: &str,
) -> page::Model {
    audit_service::add_page(
        pool,
        user_id,
        audit_id,
        &CreatePageRequest {
            page_type: PageType::Extra,
            name: name.to_string(),
            url: url.to_string(),
            location: String::new(),
        },
    )
    .await
    .expect("Failed to add page")
}
