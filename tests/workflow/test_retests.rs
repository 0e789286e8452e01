//! Equality-body retest numbering and issue carry-over.

use amp_lib::db::DbPool;
use amp_lib::error::AppError;
use amp_lib::models::audit::{
    CheckResultInput, PageCheckResultsRequest, PageRetestRequest, RetestCheckResultInput,
};
use amp_lib::models::retest::{RetestCheckResultUpdate, RetestPageUpdate, StartRetestRequest};
use amp_lib::models::{CheckResultState, EntityRef, HistoryEventType, RetestState};
use amp_lib::services::{audit as audit_service, retests};
use serde_json::json;

use crate::test_helpers::*;

fn start_request() -> StartRetestRequest {
    StartRetestRequest {
        date_of_retest: Some(date(2025, 1, 15)),
        retest_notes: String::new(),
    }
}

async fn fail_checks(pool: &DbPool, user_id: i32, page_id: i32, wcag_ids: &[i32]) -> Vec<i32> {
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
    .unwrap()
    .into_iter()
    .map(|r| r.id)
    .collect()
}

/// Case with two failing pages: Contact fails both definitions, Search
/// fails the first. Contact's first failure was fixed at the 12-week retest.
struct Fixture {
    pool: DbPool,
    user_id: i32,
    case_id: i32,
    contact_page_id: i32,
    search_page_id: i32,
}

async fn fixture() -> Fixture {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;
    let audit = create_audit(&pool, user.id, case.id).await;
    let images = create_wcag(&pool, "1.1.1 Non-text content", "").await;
    let contrast = create_wcag(&pool, "1.4.3 Contrast", "").await;

    let contact = add_page(&pool, user.id, audit.id, "Contact us", "https://acme.example/contact").await;
    let search = add_page(&pool, user.id, audit.id, "Search", "https://acme.example/search").await;
    let contact_results = fail_checks(&pool, user.id, contact.id, &[images.id, contrast.id]).await;
    fail_checks(&pool, user.id, search.id, &[images.id]).await;

    audit_service::update_page_retest(
        &pool,
        user.id,
        contact.id,
        &PageRetestRequest {
            results: vec![RetestCheckResultInput {
                check_result_id: contact_results[0],
                version: 1,
                retest_state: RetestState::Fixed,
                retest_notes: "Alt text added".to_string(),
            }],
            retest_complete_date: Some(date(2024, 9, 2)),
        },
    )
    .await
    .unwrap();

    Fixture {
        pool,
        user_id: user.id,
        case_id: case.id,
        contact_page_id: contact.id,
        search_page_id: search.id,
    }
}

#[tokio::test]
async fn test_first_retest_records_original_test_and_unfixed_issues() {
    let f = fixture().await;

    let first = retests::start_retest(&f.pool, f.user_id, f.case_id, &start_request())
        .await
        .unwrap();
    assert_eq!(first.retest.id_within_case, 1);
    assert_eq!(first.pages.len(), 2);
    assert_eq!(first.check_results.len(), 2);
    assert!(first
        .check_results
        .iter()
        .all(|r| r.retest_state == RetestState::NotRetested));

    let all = f.pool.list_retests(f.case_id).await.unwrap();
    assert_eq!(all.len(), 2);
    let original = all.iter().find(|r| r.id_within_case == 0).expect("original test row");
    let original_detail = f.pool.get_retest_detail(original.id).await.unwrap();
    assert_eq!(original_detail.check_results.len(), 3);
    assert_eq!(
        original_detail
            .check_results
            .iter()
            .filter(|r| r.retest_state == RetestState::Fixed)
            .count(),
        1
    );

    let real = retests::list_real_retests(&f.pool, f.case_id).await.unwrap();
    assert_eq!(real.len(), 1);
    assert_eq!(real[0].id, first.retest.id);
}

#[tokio::test]
async fn test_missing_page_forces_not_fixed_and_later_retests_carry_the_rest() {
    let f = fixture().await;
    let first = retests::start_retest(&f.pool, f.user_id, f.case_id, &start_request())
        .await
        .unwrap();

    let contact_page = first
        .pages
        .iter()
        .find(|p| p.page_id == f.contact_page_id)
        .expect("contact page in scope");
    let search_page = first
        .pages
        .iter()
        .find(|p| p.page_id == f.search_page_id)
        .expect("search page in scope");
    let contact_result = first
        .check_results
        .iter()
        .find(|r| r.retest_page_id == contact_page.id)
        .unwrap();
    let search_result = first
        .check_results
        .iter()
        .find(|r| r.retest_page_id == search_page.id)
        .unwrap();

    retests::update_retest_page(
        &f.pool,
        f.user_id,
        contact_page.id,
        &RetestPageUpdate {
            version: contact_page.version,
            results: vec![RetestCheckResultUpdate {
                retest_check_result_id: contact_result.id,
                version: contact_result.version,
                retest_state: RetestState::Fixed,
                retest_notes: String::new(),
            }],
            complete_date: Some(date(2025, 1, 15)),
            missing_date: None,
            additional_issues_notes: String::new(),
        },
    )
    .await
    .unwrap();

    let search_results = retests::update_retest_page(
        &f.pool,
        f.user_id,
        search_page.id,
        &RetestPageUpdate {
            version: search_page.version,
            results: vec![RetestCheckResultUpdate {
                retest_check_result_id: search_result.id,
                version: search_result.version,
                retest_state: RetestState::Fixed,
                retest_notes: String::new(),
            }],
            complete_date: None,
            missing_date: Some(date(2025, 1, 15)),
            additional_issues_notes: "Search page removed".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(search_results.len(), 1);
    assert_eq!(search_results[0].retest_state, RetestState::NotFixed);

    let second = retests::start_retest(
        &f.pool,
        f.user_id,
        f.case_id,
        &StartRetestRequest {
            date_of_retest: Some(date(2025, 3, 1)),
            retest_notes: "Second look".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(second.retest.id_within_case, 2);
    assert_eq!(second.pages.len(), 1);
    assert_eq!(second.pages[0].page_id, f.search_page_id);
    assert_eq!(second.check_results.len(), 1);
    assert_eq!(second.check_results[0].check_result_id, search_result.check_result_id);
    assert_eq!(second.check_results[0].retest_state, RetestState::NotRetested);

    assert_eq!(retests::list_real_retests(&f.pool, f.case_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_original_test_row_is_read_only() {
    let f = fixture().await;
    retests::start_retest(&f.pool, f.user_id, f.case_id, &start_request())
        .await
        .unwrap();
    let original = f
        .pool
        .list_retests(f.case_id)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.id_within_case == 0)
        .unwrap();

    let result = retests::update_retest(
        &f.pool,
        f.user_id,
        original.id,
        &patch(original.version, json!({"retest_notes": "edited"})),
    )
    .await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}

#[tokio::test]
async fn test_retest_needs_an_audit() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;

    let result = retests::start_retest(&pool, user.id, case.id, &start_request()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(pool.list_retests(case.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_retest_page_update_rejects_stale_versions() {
    let f = fixture().await;
    let first = retests::start_retest(&f.pool, f.user_id, f.case_id, &start_request())
        .await
        .unwrap();
    let page = first
        .pages
        .iter()
        .find(|p| p.page_id == f.contact_page_id)
        .unwrap()
        .clone();
    let result = first
        .check_results
        .iter()
        .find(|r| r.retest_page_id == page.id)
        .unwrap()
        .clone();
    let update = |page_version: i32, result_version: i32, notes: &str| RetestPageUpdate {
        version: page_version,
        results: vec![RetestCheckResultUpdate {
            retest_check_result_id: result.id,
            version: result_version,
            retest_state: RetestState::Fixed,
            retest_notes: notes.to_string(),
        }],
        complete_date: None,
        missing_date: None,
        additional_issues_notes: notes.to_string(),
    };

    let saved = retests::update_retest_page(
        &f.pool,
        f.user_id,
        page.id,
        &update(page.version, result.version, "Checked"),
    )
    .await
    .unwrap();
    assert_eq!(saved[0].version, result.version + 1);

    // Page read before the first save.
    let stale_page = retests::update_retest_page(
        &f.pool,
        f.user_id,
        page.id,
        &update(page.version, saved[0].version, "Rechecked"),
    )
    .await;
    assert!(matches!(
        stale_page,
        Err(AppError::StaleVersion { entity: "Retest page", .. })
    ));

    let detail = f.pool.get_retest_detail(first.retest.id).await.unwrap();
    let page_now = detail.pages.iter().find(|p| p.id == page.id).unwrap();

    // Current page version but a stale result.
    let stale_result = retests::update_retest_page(
        &f.pool,
        f.user_id,
        page.id,
        &update(page_now.version, result.version, "Rechecked"),
    )
    .await;
    assert!(matches!(
        stale_result,
        Err(AppError::StaleVersion { entity: "Retest check result", .. })
    ));

    let detail = f.pool.get_retest_detail(first.retest.id).await.unwrap();
    let stored = detail.check_results.iter().find(|r| r.id == result.id).unwrap();
    assert_eq!(stored.retest_notes, "Checked");
    assert_eq!(
        detail.pages.iter().find(|p| p.id == page.id).unwrap().additional_issues_notes,
        "Checked"
    );
}

#[tokio::test]
async fn test_retest_rows_have_creation_history() {
    let f = fixture().await;
    let first = retests::start_retest(&f.pool, f.user_id, f.case_id, &start_request())
        .await
        .unwrap();

    for page in &first.pages {
        let history = f.pool.list_entity_history(EntityRef::RetestPage(page.id)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event_type, HistoryEventType::Create);
        assert_eq!(history[0].case_id, Some(f.case_id));
        assert_eq!(history[0].author_id, Some(f.user_id));
    }
    for result in &first.check_results {
        let history = f
            .pool
            .list_entity_history(EntityRef::RetestCheckResult(result.id))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event_type, HistoryEventType::Create);
    }
}
