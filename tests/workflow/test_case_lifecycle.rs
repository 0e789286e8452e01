//! Case creation, status progression, versioning and due-date scheduling.

use amp_lib::error::AppError;
use amp_lib::models::{
    CaseListQuery, CaseStatus, CaseSummary, CaseVariant, CreateCaseRequest, DeactivateCaseRequest,
};
use amp_lib::services::{audit as audit_service, case_workflow};
use serde_json::json;

use crate::test_helpers::*;

#[tokio::test]
async fn test_status_follows_the_case_through_testing() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;

    let case = create_case(&pool, user.id).await;
    assert_eq!(case.case_identifier, "#S-1");
    assert_eq!(case.version, 1);
    assert_eq!(case.status, CaseStatus::UnassignedCase);
    assert_eq!(case.domain, "acme.example");

    let outcome = case_workflow::update_case(
        &pool,
        user.id,
        case.id,
        &patch(case.version, json!({"auditor_id": user.id})),
    )
    .await
    .unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.instance.version, 2);
    assert_eq!(outcome.instance.status, CaseStatus::ReportInProgress);

    let audit = create_audit(&pool, user.id, case.id).await;
    assert_eq!(
        pool.get_case(case.id).await.unwrap().status,
        CaseStatus::TestInProgress
    );

    audit_service::update_audit(
        &pool,
        user.id,
        audit.id,
        &patch(audit.version, json!({"audit_pages_complete_date": "2024-06-10"})),
    )
    .await
    .unwrap();

    assert_eq!(
        pool.get_case(case.id).await.unwrap().status,
        CaseStatus::ReportInProgress
    );
    assert_eq!(
        case_workflow::current_status(&pool, case.id).await.unwrap(),
        CaseStatus::ReportInProgress
    );
}

#[tokio::test]
async fn test_second_case_gets_next_number() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;

    create_case(&pool, user.id).await;
    let second = case_workflow::create_case(
        &pool,
        user.id,
        case_request("Beta Council", "https://www.beta.example/home"),
    )
    .await
    .unwrap();

    assert_eq!(second.case_number, 2);
    assert_eq!(second.case_identifier, "#S-2");
    assert_eq!(second.domain, "beta.example");
}

#[tokio::test]
async fn test_create_case_requires_home_page_url() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;

    let result = case_workflow::create_case(&pool, user.id, case_request("Acme", "  ")).await;
    match result {
        Err(AppError::Validation(errors)) => assert!(errors.contains_key("home_page_url")),
        other => panic!("expected validation error, got {:?}", other.map(|c| c.id)),
    }
}

#[tokio::test]
async fn test_stale_version_is_rejected() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;

    let first = case_workflow::update_case(&pool, user.id, case.id, &patch(1, json!({"notes": "a"})))
        .await
        .unwrap();
    let second = case_workflow::update_case(&pool, user.id, case.id, &patch(2, json!({"notes": "b"})))
        .await
        .unwrap();
    assert_eq!(first.instance.version, 2);
    assert_eq!(second.instance.version, 3);

    // A second editor still holding version 2.
    let stale =
        case_workflow::update_case(&pool, user.id, case.id, &patch(2, json!({"notes": "c"}))).await;
    assert!(matches!(
        stale,
        Err(AppError::StaleVersion { entity: "Case", expected: 2, .. })
    ));

    let stored = pool.get_case(case.id).await.unwrap();
    assert_eq!(stored.notes, "b");
    assert_eq!(stored.version, 3);

    let retried =
        case_workflow::update_case(&pool, user.id, case.id, &patch(3, json!({"notes": "c"})))
            .await
            .unwrap();
    assert_eq!(retried.instance.version, 4);
}

#[tokio::test]
async fn test_noop_update_does_not_bump_version() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;

    let outcome = case_workflow::update_case(
        &pool,
        user.id,
        case.id,
        &patch(1, json!({"organisation_name": "Acme"})),
    )
    .await
    .unwrap();

    assert!(!outcome.changed);
    assert_eq!(pool.get_case(case.id).await.unwrap().version, 1);
}

#[tokio::test]
async fn test_protected_and_unknown_fields_are_rejected() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;

    let result = case_workflow::update_case(
        &pool,
        user.id,
        case.id,
        &patch(
            1,
            json!({
                "status": "complete",
                "report_followup_week_1_due_date": "2024-01-01",
                "favourite_colour": "blue"
            }),
        ),
    )
    .await;

    match result {
        Err(AppError::Validation(errors)) => {
            assert!(errors.contains_key("status"));
            assert!(errors.contains_key("report_followup_week_1_due_date"));
            assert!(errors.contains_key("favourite_colour"));
        }
        other => panic!("expected validation error, got {:?}", other.map(|o| o.changed)),
    }
    assert_eq!(pool.get_case(case.id).await.unwrap().version, 1);
}

#[tokio::test]
async fn test_report_sent_date_schedules_followups() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;

    let sent = case_workflow::update_case(
        &pool,
        user.id,
        case.id,
        &patch(1, json!({"report_sent_date": "2024-03-01"})),
    )
    .await
    .unwrap()
    .instance;
    assert_eq!(sent.report_followup_week_1_due_date, Some(date(2024, 3, 8)));
    assert_eq!(sent.report_followup_week_4_due_date, Some(date(2024, 3, 29)));
    assert_eq!(sent.report_followup_week_12_due_date, Some(date(2024, 5, 24)));

    let cleared = case_workflow::update_case(
        &pool,
        user.id,
        case.id,
        &patch(sent.version, json!({"report_sent_date": null})),
    )
    .await
    .unwrap()
    .instance;
    assert_eq!(cleared.report_followup_week_1_due_date, None);
    assert_eq!(cleared.report_followup_week_4_due_date, None);
    assert_eq!(cleared.report_followup_week_12_due_date, None);

    let resent = case_workflow::update_case(
        &pool,
        user.id,
        case.id,
        &patch(cleared.version, json!({"report_sent_date": "2024-04-01"})),
    )
    .await
    .unwrap()
    .instance;
    assert_eq!(resent.report_followup_week_1_due_date, Some(date(2024, 4, 8)));
    assert_eq!(resent.report_followup_week_12_due_date, Some(date(2024, 6, 24)));

    // Unrelated edits leave the schedule alone.
    let edited = case_workflow::update_case(
        &pool,
        user.id,
        case.id,
        &patch(resent.version, json!({"notes": "chased by phone"})),
    )
    .await
    .unwrap()
    .instance;
    assert_eq!(edited.report_followup_week_4_due_date, Some(date(2024, 4, 29)));
}

#[tokio::test]
async fn test_deactivate_and_reactivate() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;

    let deactivated = case_workflow::deactivate_case(
        &pool,
        user.id,
        case.id,
        DeactivateCaseRequest {
            version: 1,
            deactivate_notes: "Duplicate".to_string(),
        },
    )
    .await
    .unwrap()
    .instance;
    assert!(deactivated.is_deactivated);
    assert_eq!(deactivated.status, CaseStatus::Deactivated);

    let reactivated = case_workflow::reactivate_case(&pool, user.id, case.id, deactivated.version)
        .await
        .unwrap()
        .instance;
    assert!(!reactivated.is_deactivated);
    assert_eq!(reactivated.status, CaseStatus::UnassignedCase);
}

#[tokio::test]
async fn test_history_records_changes() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    let case = create_case(&pool, user.id).await;

    case_workflow::update_case(&pool, user.id, case.id, &patch(1, json!({"notes": "first"})))
        .await
        .unwrap();

    let history = case_workflow::case_history(&pool, case.id).await.unwrap();
    let update = history
        .iter()
        .find(|entry| entry.kind == "update")
        .expect("update entry");
    assert_eq!(update.detail["notes"], json!(["", "first"]));
    assert!(history.iter().any(|entry| entry.kind == "case_event:create"));
}

#[tokio::test]
async fn test_case_list_filters_by_variant_and_search() {
    let pool = create_test_pool().await;
    let user = create_user(&pool, "Alice").await;
    create_case(&pool, user.id).await;
    case_workflow::create_case(
        &pool,
        user.id,
        CreateCaseRequest {
            variant: CaseVariant::Detailed,
            ..case_request("Beta Trust", "https://beta.example")
        },
    )
    .await
    .unwrap();

    let (all, pagination) = pool.list_cases(&CaseListQuery::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(pagination.total, 2);

    let detailed = CaseListQuery {
        variant: Some(CaseVariant::Detailed),
        ..Default::default()
    };
    let (found, _) = pool.list_cases(&detailed).await.unwrap();
    let summaries: Vec<&CaseSummary> = found.iter().collect();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].case_identifier, "#D-1");
    assert_eq!(summaries[0].organisation_name, "Beta Trust");

    let search = CaseListQuery {
        search: Some("acme".to_string()),
        ..Default::default()
    };
    let (found, _) = pool.list_cases(&search).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].domain, "acme.example");
}
