//! Check results against the WCAG and statement catalogues, with
//! optimistic concurrency on every write.

use amp_lib::db::DbPool;
use amp_lib::error::AppError;
use amp_lib::models::audit::{
    CheckResultInput, PageCheckResultsRequest, PageRetestRequest, RetestCheckResultInput,
    StatementCheckResultInput,
};
use amp_lib::models::catalogue::CreateStatementCheckRequest;
use amp_lib::models::{CheckResultState, RetestState, StatementCheckResultState, StatementCheckType};
use amp_lib::services::audit as audit_service;

use crate::test_helpers::*;

fn result(wcag_definition_id: i32, version: i32, notes: &str) -> CheckResultInput {
    CheckResultInput {
        wcag_definition_id,
        version,
        check_result_state: CheckResultState::Error,
        notes: notes.to_string(),
    }
}

async fn record(
    pool: &DbPool,
    user_id: i32,
    page_id: i32,
    results: Vec<CheckResultInput>,
) -> Result<Vec<amp_lib::entity::check_result::Model>, AppError> {
    audit_service::update_page_check_results(
        pool,
        user_id,
        page_id,
        &PageCheckResultsRequest {
            results,
            complete_date: None,
        },
    )
    .await
}

async fn create_statement_check(pool: &DbPool, label: &str, position: i32) -> i32 {
    pool.create_statement_check(&CreateStatementCheckRequest {
        check_type: StatementCheckType::Overview,
        label: label.to_string(),
        success_criteria: String::new(),
        report_text: String::new(),
        position: Some(position),
        date_start: Some(date(2020, 1, 1)),
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn test_check_result_rejects_stale_version() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    let audit = create_audit(&pool, user.id, case.id).await;
    let images = create_wcag(&pool, "1.1.1 Non-text content", "").await;
    let page = add_page(&pool, user.id, audit.id, "Contact us", "https://acme.example/contact").await;

    let created = record(&pool, user.id, page.id, vec![result(images.id, 0, "Logo")])
        .await
        .unwrap();
    assert_eq!(created[0].version, 1);

    // A second client that also saw no result yet.
    let stale = record(&pool, user.id, page.id, vec![result(images.id, 0, "Banner")]).await;
    assert!(matches!(
        stale,
        Err(AppError::StaleVersion { id, expected: 0, .. }) if id == created[0].id
    ));

    let updated = record(&pool, user.id, page.id, vec![result(images.id, 1, "Banner")])
        .await
        .unwrap();
    assert_eq!(updated[0].version, 2);
    assert_eq!(updated[0].notes, "Banner");

    let stale = record(&pool, user.id, page.id, vec![result(images.id, 1, "Footer")]).await;
    assert!(matches!(stale, Err(AppError::StaleVersion { .. })));
    let stored = pool.get_audit_data(audit.id).await.unwrap();
    assert_eq!(stored.check_results.len(), 1);
    assert_eq!(stored.check_results[0].notes, "Banner");
}

#[tokio::test]
async fn test_new_result_must_not_claim_a_version() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    let audit = create_audit(&pool, user.id, case.id).await;
    let images = create_wcag(&pool, "1.1.1 Non-text content", "").await;
    let page = add_page(&pool, user.id, audit.id, "Contact us", "https://acme.example/contact").await;

    let result = record(&pool, user.id, page.id, vec![result(images.id, 3, "")]).await;
    match result {
        Err(AppError::Validation(fields)) => assert!(fields.contains_key("version")),
        other => panic!("expected a validation error, got {:?}", other),
    }
    assert!(pool.get_audit_data(audit.id).await.unwrap().check_results.is_empty());
}

#[tokio::test]
async fn test_retest_of_check_result_rejects_stale_version() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    let audit = create_audit(&pool, user.id, case.id).await;
    let images = create_wcag(&pool, "1.1.1 Non-text content", "").await;
    let page = add_page(&pool, user.id, audit.id, "Contact us", "https://acme.example/contact").await;
    let created = record(&pool, user.id, page.id, vec![result(images.id, 0, "")])
        .await
        .unwrap();

    let retest = |version: i32, retest_state: RetestState| PageRetestRequest {
        results: vec![RetestCheckResultInput {
            check_result_id: created[0].id,
            version,
            retest_state,
            retest_notes: String::new(),
        }],
        retest_complete_date: None,
    };

    let fixed = audit_service::update_page_retest(&pool, user.id, page.id, &retest(1, RetestState::Fixed))
        .await
        .unwrap();
    assert_eq!(fixed[0].version, 2);

    let stale =
        audit_service::update_page_retest(&pool, user.id, page.id, &retest(1, RetestState::NotFixed))
            .await;
    assert!(matches!(stale, Err(AppError::StaleVersion { expected: 1, .. })));
    let stored = pool.get_audit_data(audit.id).await.unwrap();
    assert_eq!(stored.check_results[0].retest_state, RetestState::Fixed);
}

#[tokio::test]
async fn test_expired_wcag_definition_keeps_existing_results() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    let audit = create_audit(&pool, user.id, case.id).await;
    let images = create_wcag(&pool, "1.1.1 Non-text content", "").await;
    let contact = add_page(&pool, user.id, audit.id, "Contact us", "https://acme.example/contact").await;
    let search = add_page(&pool, user.id, audit.id, "Search", "https://acme.example/search").await;
    let created = record(&pool, user.id, contact.id, vec![result(images.id, 0, "Logo")])
        .await
        .unwrap();

    // Retired before the audit's date of test.
    pool.end_wcag_definition(images.id, date(2024, 6, 1)).await.unwrap();
    let available = pool.list_wcag_definitions(Some(date(2024, 6, 3))).await.unwrap();
    assert!(available.iter().all(|w| w.id != images.id));

    let rejected = record(&pool, user.id, search.id, vec![result(images.id, 0, "Icon")]).await;
    match rejected {
        Err(AppError::Validation(fields)) => assert!(fields.contains_key("wcag_definition_id")),
        other => panic!("expected a validation error, got {:?}", other),
    }

    let kept = record(&pool, user.id, contact.id, vec![result(images.id, 1, "Logo and banner")])
        .await
        .unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].id, created[0].id);
    assert_eq!(kept[0].notes, "Logo and banner");

    let data = pool.get_audit_data(audit.id).await.unwrap();
    assert_eq!(data.check_results.len(), 1);
    assert_eq!(
        data.wcag_definition(images.id).map(|w| w.date_end),
        Some(Some(date(2024, 6, 1)))
    );
}

#[tokio::test]
async fn test_expired_statement_check_is_not_added_but_existing_results_stay() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    let current = create_statement_check(&pool, "Statement exists", 1).await;
    let retired = create_statement_check(&pool, "Statement is in the footer", 2).await;
    pool.end_statement_check(retired, date(2024, 1, 1)).await.unwrap();

    let audit = create_audit(&pool, user.id, case.id).await;
    let data = pool.get_audit_data(audit.id).await.unwrap();
    assert_eq!(data.statement_check_results.len(), 1);
    assert_eq!(data.statement_check_results[0].statement_check_id, Some(current));

    // Retiring a check after the audit started leaves its result in place.
    pool.end_statement_check(current, date(2024, 6, 1)).await.unwrap();
    let existing = pool.get_audit_data(audit.id).await.unwrap().statement_check_results[0].clone();

    let input = |version: i32, state: StatementCheckResultState| StatementCheckResultInput {
        statement_check_result_id: existing.id,
        version,
        check_result_state: Some(state),
        report_comment: Some("No statement link on the home page".to_string()),
        retest_state: None,
        retest_comment: None,
    };
    let updated = audit_service::update_statement_check_results(
        &pool,
        user.id,
        audit.id,
        &[input(existing.version, StatementCheckResultState::No)],
    )
    .await
    .unwrap();
    assert_eq!(updated.statement_check_results.len(), 1);
    assert_eq!(
        updated.statement_check_results[0].check_result_state,
        StatementCheckResultState::No
    );
    assert_eq!(updated.statement_check_results[0].version, existing.version + 1);

    let stale = audit_service::update_statement_check_results(
        &pool,
        user.id,
        audit.id,
        &[input(existing.version, StatementCheckResultState::Yes)],
    )
    .await;
    assert!(matches!(stale, Err(AppError::StaleVersion { .. })));
    let stored = pool.get_audit_data(audit.id).await.unwrap();
    assert_eq!(
        stored.statement_check_results[0].check_result_state,
        StatementCheckResultState::No
    );
}
