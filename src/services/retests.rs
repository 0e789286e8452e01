//! Equality-body retests.
//!
//! Retests are numbered within their case. The first retest of a case also
//! records a row numbered `0` standing for the original test, so comparisons
//! always have a predecessor.

use chrono::Utc;
use sea_orm::*;
use tracing::info;

use crate::db::audits::load_audit_data;
use crate::db::cases::{find_audit_for_case, find_case};
use crate::db::history::{record_case_event, record_create};
use crate::db::retests::{
    RetestDetail, find_retest, find_retest_page, list_retest_check_results, list_retest_pages,
    list_retests,
};
use crate::db::{self, DbPool, check_version, save_versioned};
use crate::entity::retest::{self, Entity as Retest};
use crate::entity::retest_check_result::{self, Entity as RetestCheckResult};
use crate::entity::retest_page::{self, Entity as RetestPage};
use crate::error::{AppError, AppResult};
use crate::models::retest::{
    ORIGINAL_TEST_ID_WITHIN_CASE, RetestDecision, RetestPageUpdate, StartRetestRequest,
};
use crate::models::{AuditData, CaseEventType, EntityRef, RetestState, SaveOutcome, VersionedUpdate};
use crate::services::history::apply_patch;

const RETEST_PROTECTED: &[&str] = &["case_id", "id_within_case", "is_deleted"];

/// An issue carried into a retest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedIssue {
    pub check_result_id: i32,
    pub wcag_definition_id: i32,
    pub retest_state: RetestState,
}

/// A page in scope of a retest with the issues carried onto it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPage {
    pub page_id: i32,
    pub issues: Vec<PlannedIssue>,
}

/// Scope of the original test: retestable pages with every failed check and
/// its 12-week retest outcome.
pub fn plan_original_test(data: &AuditData) -> Vec<PlannedPage> {
    data.retestable_pages()
        .into_iter()
        .map(|page| PlannedPage {
            page_id: page.id,
            issues: data
                .check_results_for_page(page.id)
                .into_iter()
                .filter(|r| r.is_failed())
                .map(|r| PlannedIssue {
                    check_result_id: r.id,
                    wcag_definition_id: r.wcag_definition_id,
                    retest_state: r.retest_state,
                })
                .collect(),
        })
        .collect()
}

/// Scope of the first retest: the issues still unfixed after the 12-week
/// retest, grouped by page.
pub fn plan_first_retest(data: &AuditData) -> Vec<PlannedPage> {
    let unfixed = data.unfixed_check_results();
    data.testable_pages()
        .into_iter()
        .filter_map(|page| {
            let issues: Vec<PlannedIssue> = unfixed
                .iter()
                .filter(|r| r.page_id == page.id)
                .map(|r| PlannedIssue {
                    check_result_id: r.id,
                    wcag_definition_id: r.wcag_definition_id,
                    retest_state: RetestState::NotRetested,
                })
                .collect();
            (!issues.is_empty()).then_some(PlannedPage {
                page_id: page.id,
                issues,
            })
        })
        .collect()
}

/// Scope of a later retest: the previous retest's pages with the issues it
/// did not find fixed.
pub fn plan_next_retest(
    previous_pages: &[retest_page::Model],
    previous_results: &[retest_check_result::Model],
) -> Vec<PlannedPage> {
    previous_pages
        .iter()
        .filter_map(|page| {
            let issues: Vec<PlannedIssue> = previous_results
                .iter()
                .filter(|r| r.retest_page_id == page.id && r.retest_state != RetestState::Fixed)
                .map(|r| PlannedIssue {
                    check_result_id: r.check_result_id,
                    wcag_definition_id: r.wcag_definition_id,
                    retest_state: RetestState::NotRetested,
                })
                .collect();
            (!issues.is_empty()).then_some(PlannedPage {
                page_id: page.page_id,
                issues,
            })
        })
        .collect()
}

async fn insert_retest<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    case_id: i32,
    id_within_case: i32,
    request: &StartRetestRequest,
    plan: &[PlannedPage],
) -> AppResult<retest::Model> {
    let now = Utc::now();
    let retest = retest::ActiveModel {
        case_id: Set(case_id),
        id_within_case: Set(id_within_case),
        version: Set(1),
        date_of_retest: Set(request.date_of_retest),
        retest_notes: Set(request.retest_notes.clone()),
        retest_metadata_complete_date: Set(None),
        retest_pages_complete_date: Set(None),
        retest_compliance_state: Set(Default::default()),
        compliance_notes: Set(String::new()),
        retest_compliance_complete_date: Set(None),
        statement_compliance_state: Set(Default::default()),
        retest_statement_decision_complete_date: Set(None),
        retest_comparison_complete_date: Set(None),
        created: Set(now),
        updated: Set(now),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| AppError::Database(format!("Failed to create retest: {}", e)))?;
    record_create(conn, EntityRef::Retest(retest.id), Some(case_id), Some(user_id), &retest).await?;

    for planned in plan {
        let page = retest_page::ActiveModel {
            retest_id: Set(retest.id),
            page_id: Set(planned.page_id),
            version: Set(1),
            complete_date: Set(None),
            missing_date: Set(None),
            additional_issues_notes: Set(String::new()),
            is_deleted: Set(false),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        record_create(conn, EntityRef::RetestPage(page.id), Some(case_id), Some(user_id), &page)
            .await?;

        for issue in &planned.issues {
            let result = retest_check_result::ActiveModel {
                retest_id: Set(retest.id),
                retest_page_id: Set(page.id),
                check_result_id: Set(issue.check_result_id),
                wcag_definition_id: Set(issue.wcag_definition_id),
                version: Set(1),
                retest_state: Set(issue.retest_state),
                retest_notes: Set(String::new()),
                is_deleted: Set(false),
                ..Default::default()
            }
            .insert(conn)
            .await?;
            record_create(
                conn,
                EntityRef::RetestCheckResult(result.id),
                Some(case_id),
                Some(user_id),
                &result,
            )
            .await?;
        }
    }

    Ok(retest)
}

/// Start the next equality-body retest of a case.
pub async fn start_retest(
    pool: &DbPool,
    user_id: i32,
    case_id: i32,
    request: &StartRetestRequest,
) -> AppResult<RetestDetail> {
    let txn = pool.begin().await?;
    find_case(&txn, case_id).await?;
    let audit = find_audit_for_case(&txn, case_id)
        .await?
        .ok_or_else(|| AppError::field("audit", "Start the test before starting a retest"))?;

    let mut existing = list_retests(&txn, case_id).await?;
    if existing.is_empty() {
        let data = load_audit_data(&txn, audit.id).await?;
        let original = StartRetestRequest {
            date_of_retest: Some(audit.date_of_test),
            retest_notes: String::new(),
        };
        let row = insert_retest(
            &txn,
            user_id,
            case_id,
            ORIGINAL_TEST_ID_WITHIN_CASE,
            &original,
            &plan_original_test(&data),
        )
        .await?;
        existing.push(row);
    }

    let previous = existing
        .iter()
        .max_by_key(|r| r.id_within_case)
        .cloned()
        .ok_or_else(|| AppError::Database("Retest numbering is empty".to_string()))?;
    let plan = if previous.is_original_test() {
        plan_first_retest(&load_audit_data(&txn, audit.id).await?)
    } else {
        plan_next_retest(
            &list_retest_pages(&txn, previous.id).await?,
            &list_retest_check_results(&txn, previous.id).await?,
        )
    };

    let id_within_case = previous.id_within_case + 1;
    let retest = insert_retest(&txn, user_id, case_id, id_within_case, request, &plan).await?;
    record_case_event(
        &txn,
        case_id,
        CaseEventType::StartRetest,
        format!("Started retest #{}", id_within_case),
        Some(user_id),
    )
    .await?;

    let pages = list_retest_pages(&txn, retest.id).await?;
    let check_results = list_retest_check_results(&txn, retest.id).await?;
    db::commit(txn).await?;
    info!(case_id, retest_id = retest.id, id_within_case, "Retest started");
    Ok(RetestDetail {
        retest,
        pages,
        check_results,
    })
}

async fn save_retest<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    current: &retest::Model,
    edited: retest::Model,
) -> AppResult<SaveOutcome<retest::Model>> {
    let saved = save_versioned::<Retest, retest::ActiveModel, _>(
        conn,
        EntityRef::Retest(current.id),
        Some(current.case_id),
        Some(user_id),
        current,
        edited,
        retest::Column::Id,
        retest::Column::Version,
    )
    .await?;
    let changed = saved.is_some();
    Ok(SaveOutcome {
        instance: saved.map(|s| s.model).unwrap_or_else(|| current.clone()),
        changed,
        messages: Vec::new(),
        next_page_url: None,
    })
}

fn reject_original(retest: &retest::Model) -> AppResult<()> {
    if retest.is_original_test() {
        return Err(AppError::InvalidInput(format!(
            "Retest {} stands for the original test and cannot be edited",
            retest.id
        )));
    }
    Ok(())
}

/// Versioned update of retest metadata.
pub async fn update_retest(
    pool: &DbPool,
    user_id: i32,
    retest_id: i32,
    update: &VersionedUpdate,
) -> AppResult<SaveOutcome<retest::Model>> {
    let txn = pool.begin().await?;
    let current = find_retest(&txn, retest_id).await?;
    reject_original(&current)?;
    check_version("Retest", retest_id, current.version, update.version)?;
    let edited: retest::Model = apply_patch(&current, &update.fields, RETEST_PROTECTED)?;
    let outcome = save_retest(&txn, user_id, &current, edited).await?;
    db::commit(txn).await?;
    Ok(outcome)
}

/// Record compliance decisions of a retest.
pub async fn decide_retest(
    pool: &DbPool,
    user_id: i32,
    retest_id: i32,
    decision: &RetestDecision,
) -> AppResult<SaveOutcome<retest::Model>> {
    let txn = pool.begin().await?;
    let current = find_retest(&txn, retest_id).await?;
    reject_original(&current)?;
    check_version("Retest", retest_id, current.version, decision.version)?;
    let edited = retest::Model {
        retest_compliance_state: decision.retest_compliance_state,
        compliance_notes: decision.compliance_notes.clone(),
        statement_compliance_state: decision
            .statement_compliance_state
            .unwrap_or(current.statement_compliance_state),
        ..current.clone()
    };
    let outcome = save_retest(&txn, user_id, &current, edited).await?;
    db::commit(txn).await?;
    Ok(outcome)
}

/// Record retest outcomes for one page of a retest.
///
/// A page missing at retest marks all of its issues not fixed, whatever the
/// submitted states say.
pub async fn update_retest_page(
    pool: &DbPool,
    user_id: i32,
    retest_page_id: i32,
    update: &RetestPageUpdate,
) -> AppResult<Vec<retest_check_result::Model>> {
    let txn = pool.begin().await?;
    let page = find_retest_page(&txn, retest_page_id).await?;
    let retest = find_retest(&txn, page.retest_id).await?;
    reject_original(&retest)?;
    check_version("Retest page", page.id, page.version, update.version)?;
    let case_id = Some(retest.case_id);

    let results: Vec<retest_check_result::Model> = RetestCheckResult::find()
        .filter(retest_check_result::Column::RetestPageId.eq(retest_page_id))
        .filter(retest_check_result::Column::IsDeleted.eq(false))
        .order_by_asc(retest_check_result::Column::Id)
        .all(&txn)
        .await?;

    for input in &update.results {
        let current = results
            .iter()
            .find(|r| r.id == input.retest_check_result_id)
            .ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Retest check result {} does not belong to retest page {}",
                    input.retest_check_result_id, retest_page_id
                ))
            })?;
        check_version("Retest check result", current.id, current.version, input.version)?;
        let retest_state = if update.missing_date.is_some() {
            RetestState::NotFixed
        } else {
            input.retest_state
        };
        let edited = retest_check_result::Model {
            retest_state,
            retest_notes: input.retest_notes.clone(),
            ..current.clone()
        };
        save_versioned::<RetestCheckResult, retest_check_result::ActiveModel, _>(
            &txn,
            EntityRef::RetestCheckResult(current.id),
            case_id,
            Some(user_id),
            current,
            edited,
            retest_check_result::Column::Id,
            retest_check_result::Column::Version,
        )
        .await?;
    }

    if update.missing_date.is_some() {
        for current in results
            .iter()
            .filter(|r| !update.results.iter().any(|i| i.retest_check_result_id == r.id))
        {
            let edited = retest_check_result::Model {
                retest_state: RetestState::NotFixed,
                ..current.clone()
            };
            save_versioned::<RetestCheckResult, retest_check_result::ActiveModel, _>(
                &txn,
                EntityRef::RetestCheckResult(current.id),
                case_id,
                Some(user_id),
                current,
                edited,
                retest_check_result::Column::Id,
                retest_check_result::Column::Version,
            )
            .await?;
        }
    }

    let edited_page = retest_page::Model {
        complete_date: update.complete_date,
        missing_date: update.missing_date,
        additional_issues_notes: update.additional_issues_notes.clone(),
        ..page.clone()
    };
    save_versioned::<RetestPage, retest_page::ActiveModel, _>(
        &txn,
        EntityRef::RetestPage(page.id),
        case_id,
        Some(user_id),
        &page,
        edited_page,
        retest_page::Column::Id,
        retest_page::Column::Version,
    )
    .await?;

    let updated = RetestCheckResult::find()
        .filter(retest_check_result::Column::RetestPageId.eq(retest_page_id))
        .filter(retest_check_result::Column::IsDeleted.eq(false))
        .order_by_asc(retest_check_result::Column::Id)
        .all(&txn)
        .await?;
    db::commit(txn).await?;
    Ok(updated)
}

/// Retests shown on the retest overview, excluding the original test row.
pub async fn list_real_retests(pool: &DbPool, case_id: i32) -> AppResult<Vec<retest::Model>> {
    Ok(pool
        .list_retests(case_id)
        .await?
        .into_iter()
        .filter(|r| !r.is_original_test())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{audit, check_result, page};
    use crate::models::{CheckResultState, PageType};

    fn result(id: i32, page_id: i32, wcag: i32, state: CheckResultState, retest: RetestState) -> check_result::Model {
        check_result::Model {
            id,
            page_id,
            wcag_definition_id: wcag,
            check_result_state: state,
            retest_state: retest,
            ..Default::default()
        }
    }

    fn audit_data() -> AuditData {
        let pages = vec![
            page::Model {
                id: 1,
                page_type: PageType::Home,
                url: "https://acme.example".to_string(),
                ..Default::default()
            },
            page::Model {
                id: 2,
                page_type: PageType::Contact,
                url: "https://acme.example/contact".to_string(),
                ..Default::default()
            },
            page::Model {
                id: 3,
                page_type: PageType::Extra,
                url: "https://acme.example/news".to_string(),
                ..Default::default()
            },
        ];
        let results = vec![
            result(10, 1, 1, CheckResultState::Error, RetestState::Fixed),
            result(11, 1, 2, CheckResultState::Error, RetestState::NotFixed),
            result(12, 2, 1, CheckResultState::Error, RetestState::Fixed),
            result(13, 3, 1, CheckResultState::NoError, RetestState::NotRetested),
        ];
        AuditData::new(audit::Model::default(), pages, results, vec![], vec![])
    }

    #[test]
    fn test_original_test_covers_all_failed_checks() {
        let plan = plan_original_test(&audit_data());
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].issues.len(), 2);
        assert_eq!(plan[0].issues[0].retest_state, RetestState::Fixed);
        assert_eq!(plan[1].page_id, 2);
    }

    #[test]
    fn test_first_retest_carries_unfixed_issues_only() {
        let plan = plan_first_retest(&audit_data());
        assert_eq!(
            plan,
            vec![PlannedPage {
                page_id: 1,
                issues: vec![PlannedIssue {
                    check_result_id: 11,
                    wcag_definition_id: 2,
                    retest_state: RetestState::NotRetested,
                }],
            }]
        );
    }

    #[test]
    fn test_next_retest_drops_fixed_issues_and_empty_pages() {
        let pages = vec![
            retest_page::Model {
                id: 100,
                page_id: 1,
                ..Default::default()
            },
            retest_page::Model {
                id: 101,
                page_id: 2,
                ..Default::default()
            },
        ];
        let results = vec![
            retest_check_result::Model {
                id: 1000,
                retest_page_id: 100,
                check_result_id: 11,
                wcag_definition_id: 2,
                retest_state: RetestState::NotFixed,
                ..Default::default()
            },
            retest_check_result::Model {
                id: 1001,
                retest_page_id: 101,
                check_result_id: 12,
                wcag_definition_id: 1,
                retest_state: RetestState::Fixed,
                ..Default::default()
            },
        ];

        let plan = plan_next_retest(&pages, &results);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].page_id, 1);
        assert_eq!(plan[0].issues[0].check_result_id, 11);
        assert_eq!(plan[0].issues[0].retest_state, RetestState::NotRetested);
    }
}
