//! Report generation and publication to the blob store.

use amp_lib::db::DbPool;
use amp_lib::entity::report;
use amp_lib::error::{AppError, AppResult};
use amp_lib::models::audit::{CheckResultInput, PageCheckResultsRequest};
use amp_lib::models::{CheckResultState, PublishedReportSummary, TemplateType};
use amp_lib::services::storage::BlobStore;
use amp_lib::services::{
    MemoryBlobStore, audit as audit_service, case_workflow, publisher, report_generator,
    templates_loader,
};
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;

use crate::test_helpers::*;

/// Store that refuses every write.
struct UnavailableBlobStore;

#[async_trait]
impl BlobStore for UnavailableBlobStore {
    async fn put(&self, key: &str, _body: Vec<u8>) -> AppResult<()> {
        Err(AppError::Storage(format!("Bucket unavailable for {}", key)))
    }

    async fn get(&self, key: &str) -> AppResult<Vec<u8>> {
        Err(AppError::NotFound(key.to_string()))
    }

    async fn head(&self, _key: &str) -> AppResult<bool> {
        Ok(false)
    }

    async fn list(&self, _prefix: &str) -> AppResult<Vec<String>> {
        Ok(Vec::new())
    }
}

const BASE_TEMPLATES: &str = include_str!("../../data/base_templates.csv");

async fn load_base_templates(pool: &DbPool) {
    let rows = templates_loader::parse_templates_csv(BASE_TEMPLATES).unwrap();
    pool.upsert_base_templates(&rows, true).await.unwrap();
}

async fn fail_checks(pool: &DbPool, user_id: i32, page_id: i32, wcag_ids: &[i32]) {
    audit_service::update_page_check_results(
        pool,
        user_id,
        page_id,
        &PageCheckResultsRequest {
            results: wcag_ids
                .iter()
                .map(|id| CheckResultInput {
                    wcag_definition_id: *id,
                    version: 0,
                    check_result_state: CheckResultState::Error,
                    notes: String::new(),
                })
                .collect(),
            complete_date: None,
        },
    )
    .await
    .unwrap();
}

async fn approve(pool: &DbPool, user_id: i32, case_id: i32) {
    let version = pool.get_case(case_id).await.unwrap().version;
    case_workflow::update_case(
        pool,
        user_id,
        case_id,
        &patch(version, json!({"report_approved_status": "approved"})),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_issue_boilerplate_appears_once_per_definition() {
    let pool = create_test_pool().await;
    load_base_templates(&pool).await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    let audit = create_audit(&pool, user.id, case.id).await;

    let images = create_wcag(&pool, "1.1.1 Non-text content", "Images need alternative text.").await;
    let contrast = create_wcag(&pool, "1.4.3 Contrast", "Text must have enough contrast.").await;
    let contact = add_page(&pool, user.id, audit.id, "Contact us", "https://acme.example/contact").await;
    let search = add_page(&pool, user.id, audit.id, "Search", "https://acme.example/search").await;
    fail_checks(&pool, user.id, contact.id, &[images.id, contrast.id]).await;
    fail_checks(&pool, user.id, search.id, &[images.id]).await;

    let sections = report_generator::generate_report(&pool, user.id, case.id)
        .await
        .unwrap();
    assert_eq!(sections.len(), 7);

    let issues = sections
        .iter()
        .find(|s| s.section.template_type == TemplateType::IssuesTable)
        .expect("issues section");
    assert_eq!(issues.rows.len(), 3);

    let with_boilerplate = issues
        .rows
        .iter()
        .filter(|r| r.cell_content_1.contains("Images need alternative text."))
        .count();
    let name_only = issues
        .rows
        .iter()
        .filter(|r| r.cell_content_1 == "1.1.1 Non-text content")
        .count();
    assert_eq!(with_boilerplate, 1);
    assert_eq!(name_only, 1);
    assert_eq!(
        issues.rows[0].cell_content_1,
        "1.1.1 Non-text content\n\nImages need alternative text."
    );

    let introduction = &sections[0].section;
    assert!(introduction.content.contains("https://acme.example"));
    assert!(introduction.content.contains("2024-06-03"));
}

#[tokio::test]
async fn test_issues_follow_catalogue_order_not_insertion_order() {
    let pool = create_test_pool().await;
    load_base_templates(&pool).await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    let audit = create_audit(&pool, user.id, case.id).await;

    let name_role = create_wcag(&pool, "4.1.2 Name, role, value", "").await;
    let revised = create_wcag(&pool, "1.1.1 Non-text content (2024 revision)", "").await;
    let catalogue: Vec<i32> = pool
        .list_wcag_definitions(Some(date(2024, 6, 3)))
        .await
        .unwrap()
        .iter()
        .map(|w| w.id)
        .collect();
    assert_eq!(catalogue, vec![revised.id, name_role.id]);

    let page = add_page(&pool, user.id, audit.id, "Contact us", "https://acme.example/contact").await;
    fail_checks(&pool, user.id, page.id, &[name_role.id, revised.id]).await;

    let sections = report_generator::generate_report(&pool, user.id, case.id)
        .await
        .unwrap();
    let issues = sections
        .iter()
        .find(|s| s.section.template_type == TemplateType::IssuesTable)
        .expect("issues section");
    let names: Vec<&str> = issues.rows.iter().map(|r| r.cell_content_1.as_str()).collect();
    assert_eq!(
        names,
        vec!["1.1.1 Non-text content (2024 revision)", "4.1.2 Name, role, value"]
    );
}

#[tokio::test]
async fn test_regeneration_replaces_sections() {
    let pool = create_test_pool().await;
    load_base_templates(&pool).await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    create_audit(&pool, user.id, case.id).await;

    let first = report_generator::generate_report(&pool, user.id, case.id)
        .await
        .unwrap();
    let second = report_generator::generate_report(&pool, user.id, case.id)
        .await
        .unwrap();

    assert_eq!(first.len(), second.len());
    let report = pool.get_report_for_case(case.id).await.unwrap();
    assert_eq!(pool.get_sections_with_rows(report.id).await.unwrap().len(), 7);
}

#[tokio::test]
async fn test_report_needs_an_audit() {
    let pool = create_test_pool().await;
    load_base_templates(&pool).await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;

    let result = report_generator::generate_report(&pool, user.id, case.id).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_publishing_versions_and_latest_flag() {
    let pool = create_test_pool().await;
    let store = MemoryBlobStore::new();
    load_base_templates(&pool).await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    create_audit(&pool, user.id, case.id).await;
    report_generator::generate_report(&pool, user.id, case.id)
        .await
        .unwrap();
    approve(&pool, user.id, case.id).await;

    let first = publisher::publish_report(&pool, &store, user.id, case.id)
        .await
        .unwrap();
    assert_eq!(first.version, 1);
    assert!(first.latest_published);
    assert!(first.key.starts_with(&format!("caseid_{}/org_acme__reportid_1__", case.id)));
    assert_eq!(publisher::published_key(&first).unwrap(), first.key);

    let second = publisher::publish_report(&pool, &store, user.id, case.id)
        .await
        .unwrap();
    assert_eq!(second.version, 2);
    assert_ne!(first.guid, second.guid);

    let published = pool.list_published_reports(case.id).await.unwrap();
    assert_eq!(published.len(), 2);
    let latest: Vec<_> = published.iter().filter(|r| r.latest_published).collect();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].version, 2);

    assert_eq!(store.len().await, 2);
    let html = String::from_utf8(store.get(&second.key).await.unwrap()).unwrap();
    assert!(html.contains("Acme"));

    let fetched = publisher::fetch_published_html(&pool, &store, &second.guid)
        .await
        .unwrap();
    assert_eq!(fetched, html);
}

#[tokio::test]
async fn test_publication_keeps_the_report_format_version() {
    let pool = create_test_pool().await;
    let store = MemoryBlobStore::new();
    load_base_templates(&pool).await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    create_audit(&pool, user.id, case.id).await;
    report_generator::generate_report(&pool, user.id, case.id)
        .await
        .unwrap();
    approve(&pool, user.id, case.id).await;

    // A report started under an earlier format.
    let report = pool.get_report_for_case(case.id).await.unwrap();
    let mut active: report::ActiveModel = report.into();
    active.report_version = Set("v1_0_0__20230101".to_string());
    active.update(pool.connection()).await.unwrap();

    let published = publisher::publish_report(&pool, &store, user.id, case.id)
        .await
        .unwrap();
    assert_eq!(published.report_version, "v1_0_0__20230101");
    assert!(published.key.contains("reportversion_v1_0_0__20230101__"));
    assert_eq!(publisher::published_key(&published).unwrap(), published.key);
    assert!(published.html.contains("Report version v1_0_0__20230101"));

    let preview = report_generator::preview_html(&pool, case.id).await.unwrap();
    assert!(preview.contains("Report version v1_0_0__20230101"));
}

#[tokio::test]
async fn test_failed_upload_leaves_no_published_report() {
    let pool = create_test_pool().await;
    load_base_templates(&pool).await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    create_audit(&pool, user.id, case.id).await;
    report_generator::generate_report(&pool, user.id, case.id)
        .await
        .unwrap();
    approve(&pool, user.id, case.id).await;

    let store = MemoryBlobStore::new();
    let first = publisher::publish_report(&pool, &store, user.id, case.id)
        .await
        .unwrap();

    let result = publisher::publish_report(&pool, &UnavailableBlobStore, user.id, case.id).await;
    assert!(matches!(result, Err(AppError::Storage(_))));

    // The earlier publication is untouched and still the latest.
    let published: Vec<PublishedReportSummary> =
        pool.list_published_reports(case.id).await.unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id, first.id);
    assert!(published[0].latest_published);

    let second = publisher::publish_report(&pool, &store, user.id, case.id)
        .await
        .unwrap();
    assert_eq!(second.version, 2);
}

#[tokio::test]
async fn test_unapproved_report_is_not_published() {
    let pool = create_test_pool().await;
    let store = MemoryBlobStore::new();
    load_base_templates(&pool).await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    create_audit(&pool, user.id, case.id).await;
    report_generator::generate_report(&pool, user.id, case.id)
        .await
        .unwrap();

    let result = publisher::publish_report(&pool, &store, user.id, case.id).await;
    assert!(matches!(result, Err(AppError::NotQaApproved(id)) if id == case.id));
    assert!(pool.list_published_reports(case.id).await.unwrap().is_empty());
    assert!(store.is_empty().await);

    let guarded = publisher::publish_or_guard(&pool, &store, user.id, case.id)
        .await
        .unwrap();
    assert!(!guarded.published);
    assert!(guarded.guard.is_some());
}

#[tokio::test]
async fn test_missing_documents_are_recreated() {
    let pool = create_test_pool().await;
    let store = MemoryBlobStore::new();
    load_base_templates(&pool).await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    create_audit(&pool, user.id, case.id).await;
    report_generator::generate_report(&pool, user.id, case.id)
        .await
        .unwrap();
    approve(&pool, user.id, case.id).await;
    publisher::publish_report(&pool, &store, user.id, case.id)
        .await
        .unwrap();

    let empty = MemoryBlobStore::new();
    assert_eq!(publisher::create_missing_documents(&pool, &empty).await.unwrap(), 1);
    assert_eq!(publisher::create_missing_documents(&pool, &empty).await.unwrap(), 0);
    assert_eq!(empty.len().await, 1);
}
