//! Audit workflow: test creation, pages, check results, statement results
//! and the 12-week retest of the initial audit.
//!
//! Every change that feeds the report stamps the audit's report-data times
//! so stale draft and published reports can be flagged.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use sea_orm::*;
use tracing::info;

use crate::db::audits::{
    find_audit, find_check_result, find_page, find_statement_check_result,
    list_check_results_for_page, load_audit_data,
};
use crate::db::cases::{find_audit_for_case, find_case};
use crate::db::catalogues::{valid_statement_checks, valid_wcag_definitions};
use crate::db::history::{record_case_event, record_create};
use crate::db::reports::{find_latest_published, find_report_for_case};
use crate::db::{self, DbPool, check_version, save_versioned};
use crate::entity::audit::{self, Entity as Audit};
use crate::entity::check_result::{self, Entity as CheckResult};
use crate::entity::page::{self, Entity as Page};
use crate::entity::statement_check_result::{self, Entity as StatementCheckResult};
use crate::entity::{report, s3_report};
use crate::error::{AppError, AppResult};
use crate::models::audit::{
    CreateAuditRequest, CreateCustomStatementIssueRequest, CreatePageRequest,
    PageCheckResultsRequest, PageMissingRequest, PageRetestRequest, ReportFreshness,
    StatementCheckResultInput,
};
use crate::models::{
    AuditData, CaseEventType, CheckResultState, EntityRef, PageType, RetestState, SaveOutcome,
    StatementCheckResultState, StatementCheckType, VersionedUpdate,
};
use crate::services::case_workflow::refresh_case_status;
use crate::services::history::apply_patch;
use crate::services::identifiers::extract_domain;

const AUDIT_PROTECTED: &[&str] = &[
    "case_id",
    "uses_statement_checks",
    "unpublished_report_data_updated_time",
    "published_report_data_updated_time",
];

const PAGE_PROTECTED: &[&str] = &["audit_id", "is_deleted"];

/// Whether a test on `date_of_test` uses the structured statement checks.
pub fn uses_statement_checks_on(date_of_test: NaiveDate) -> bool {
    NaiveDate::from_ymd_opt(2023, 1, 1).is_some_and(|start| date_of_test >= start)
}

/// Report freshness from the audit, the draft report and the latest
/// published report.
pub fn freshness(
    audit: Option<&audit::Model>,
    report: Option<&report::Model>,
    latest_published: Option<&s3_report::Model>,
) -> ReportFreshness {
    let draft_out_of_date = match (audit, report) {
        (Some(audit), Some(report)) => match (audit.unpublished_report_data_updated_time, report.report_rebuilt) {
            (Some(updated), Some(rebuilt)) => updated > rebuilt,
            (Some(_), None) => true,
            _ => false,
        },
        _ => false,
    };
    let published_out_of_date = match (audit, latest_published) {
        (Some(audit), Some(published)) => audit
            .published_report_data_updated_time
            .is_some_and(|updated| updated > published.created),
        _ => false,
    };
    ReportFreshness {
        draft_out_of_date,
        published_out_of_date,
    }
}

/// Record that report-relevant audit data changed.
pub async fn stamp_report_data_updated<C: ConnectionTrait>(conn: &C, audit_id: i32) -> AppResult<()> {
    let now = Utc::now();
    let audit = find_audit(conn, audit_id).await?;
    let mut active: audit::ActiveModel = audit.into();
    active.unpublished_report_data_updated_time = Set(Some(now));
    active.published_report_data_updated_time = Set(Some(now));
    active
        .update(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to stamp audit {}: {}", audit_id, e)))?;
    Ok(())
}

fn validate_page_url(url: &str) -> AppResult<()> {
    if !url.trim().is_empty() && extract_domain(url).is_none() {
        return Err(AppError::field("url", "Enter a valid URL"));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn insert_page<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    case_id: i32,
    audit_id: i32,
    page_type: PageType,
    name: String,
    url: String,
    location: String,
) -> AppResult<page::Model> {
    let now = Utc::now();
    let page = page::ActiveModel {
        audit_id: Set(audit_id),
        version: Set(1),
        page_type: Set(page_type),
        name: Set(name),
        url: Set(url),
        location: Set(location),
        not_found: Set(false),
        complete_date: Set(None),
        retest_complete_date: Set(None),
        retest_page_missing_date: Set(None),
        created: Set(now),
        updated: Set(now),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| AppError::Database(format!("Failed to create page: {}", e)))?;

    record_create(conn, EntityRef::Page(page.id), Some(case_id), Some(user_id), &page).await?;
    Ok(page)
}

/// Start the initial test of a case.
///
/// The statement regime is fixed here. Structured regimes get one result row
/// per statement check valid on the date of test, in catalogue order.
pub async fn create_audit(
    pool: &DbPool,
    user_id: i32,
    case_id: i32,
    request: &CreateAuditRequest,
) -> AppResult<audit::Model> {
    let txn = pool.begin().await?;
    let case = find_case(&txn, case_id).await?;
    if find_audit_for_case(&txn, case_id).await?.is_some() {
        return Err(AppError::field("case_id", "A test has already been started for this case"));
    }

    let uses_statement_checks = request
        .uses_statement_checks
        .unwrap_or_else(|| uses_statement_checks_on(request.date_of_test));
    let now = Utc::now();

    let mut active: audit::ActiveModel = audit::Model {
        case_id,
        version: 1,
        date_of_test: request.date_of_test,
        uses_statement_checks,
        created: now,
        updated: now,
        ..Default::default()
    }
    .into();
    active.id = NotSet;
    let audit = active
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create audit: {}", e)))?;
    record_create(&txn, EntityRef::Audit(audit.id), Some(case_id), Some(user_id), &audit).await?;

    for page_type in PageType::mandatory() {
        let url = if *page_type == PageType::Home {
            case.home_page_url.clone()
        } else {
            String::new()
        };
        insert_page(&txn, user_id, case_id, audit.id, *page_type, String::new(), url, String::new())
            .await?;
    }

    if uses_statement_checks {
        let checks = valid_statement_checks(&txn, request.date_of_test).await?;
        for (index, check) in checks.iter().enumerate() {
            let result = statement_check_result::ActiveModel {
                audit_id: Set(audit.id),
                statement_check_id: Set(Some(check.id)),
                check_type: Set(check.check_type),
                issue_number: Set(index as i32 + 1),
                version: Set(1),
                check_result_state: Set(StatementCheckResultState::NotTested),
                report_comment: Set(String::new()),
                retest_state: Set(StatementCheckResultState::NotTested),
                retest_comment: Set(String::new()),
                is_deleted: Set(false),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create statement result: {}", e)))?;
            record_create(
                &txn,
                EntityRef::StatementCheckResult(result.id),
                Some(case_id),
                Some(user_id),
                &result,
            )
            .await?;
        }
    }

    record_case_event(&txn, case_id, CaseEventType::CreateAudit, "Started test", Some(user_id))
        .await?;
    refresh_case_status(&txn, case_id, Some(user_id)).await?;
    db::commit(txn).await?;

    info!(case_id, audit_id = audit.id, uses_statement_checks, "Audit created");
    Ok(audit)
}

/// Apply a partial update to audit metadata, decisions or stage dates.
pub async fn update_audit(
    pool: &DbPool,
    user_id: i32,
    audit_id: i32,
    update: &VersionedUpdate,
) -> AppResult<SaveOutcome<audit::Model>> {
    let txn = pool.begin().await?;
    let current = find_audit(&txn, audit_id).await?;
    check_version("Audit", audit_id, current.version, update.version)?;
    let edited: audit::Model = apply_patch(&current, &update.fields, AUDIT_PROTECTED)?;

    let Some(_saved) = save_versioned::<Audit, audit::ActiveModel, _>(
        &txn,
        EntityRef::Audit(audit_id),
        Some(current.case_id),
        Some(user_id),
        &current,
        edited,
        audit::Column::Id,
        audit::Column::Version,
    )
    .await?
    else {
        return Ok(SaveOutcome {
            instance: current,
            changed: false,
            messages: Vec::new(),
            next_page_url: None,
        });
    };

    stamp_report_data_updated(&txn, audit_id).await?;
    let messages = refresh_case_status(&txn, current.case_id, Some(user_id))
        .await?
        .into_iter()
        .collect();
    let instance = find_audit(&txn, audit_id).await?;
    db::commit(txn).await?;

    Ok(SaveOutcome {
        instance,
        changed: true,
        messages,
        next_page_url: None,
    })
}

pub async fn add_page(
    pool: &DbPool,
    user_id: i32,
    audit_id: i32,
    request: &CreatePageRequest,
) -> AppResult<page::Model> {
    if request.url.trim().is_empty() {
        return Err(AppError::field("url", "Enter the page URL"));
    }
    validate_page_url(&request.url)?;

    let txn = pool.begin().await?;
    let audit = find_audit(&txn, audit_id).await?;
    let page = insert_page(
        &txn,
        user_id,
        audit.case_id,
        audit_id,
        request.page_type,
        request.name.trim().to_string(),
        request.url.trim().to_string(),
        request.location.clone(),
    )
    .await?;
    stamp_report_data_updated(&txn, audit_id).await?;
    db::commit(txn).await?;
    Ok(page)
}

async fn save_page<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    case_id: i32,
    current: &page::Model,
    edited: page::Model,
) -> AppResult<Option<page::Model>> {
    let saved = save_versioned::<Page, page::ActiveModel, C>(
        conn,
        EntityRef::Page(current.id),
        Some(case_id),
        Some(user_id),
        current,
        edited,
        page::Column::Id,
        page::Column::Version,
    )
    .await?;
    Ok(saved.map(|s| s.model))
}

fn page_outcome(current: page::Model, saved: Option<page::Model>) -> SaveOutcome<page::Model> {
    let changed = saved.is_some();
    SaveOutcome {
        instance: saved.unwrap_or(current),
        changed,
        messages: Vec::new(),
        next_page_url: None,
    }
}

pub async fn update_page(
    pool: &DbPool,
    user_id: i32,
    page_id: i32,
    update: &VersionedUpdate,
) -> AppResult<SaveOutcome<page::Model>> {
    let txn = pool.begin().await?;
    let current = find_page(&txn, page_id).await?;
    check_version("Page", page_id, current.version, update.version)?;
    let edited: page::Model = apply_patch(&current, &update.fields, PAGE_PROTECTED)?;
    validate_page_url(&edited.url)?;

    let audit = find_audit(&txn, current.audit_id).await?;
    let saved = save_page(&txn, user_id, audit.case_id, &current, edited).await?;
    if saved.is_some() {
        stamp_report_data_updated(&txn, audit.id).await?;
        db::commit(txn).await?;
    }
    Ok(page_outcome(current, saved))
}

/// Soft-delete a page. Its check results drop out of every view with it.
pub async fn delete_page(
    pool: &DbPool,
    user_id: i32,
    page_id: i32,
    version: i32,
) -> AppResult<SaveOutcome<page::Model>> {
    let txn = pool.begin().await?;
    let current = find_page(&txn, page_id).await?;
    check_version("Page", page_id, current.version, version)?;
    let edited = page::Model {
        is_deleted: true,
        ..current.clone()
    };

    let audit = find_audit(&txn, current.audit_id).await?;
    let saved = save_page(&txn, user_id, audit.case_id, &current, edited).await?;
    stamp_report_data_updated(&txn, audit.id).await?;
    db::commit(txn).await?;
    Ok(page_outcome(current, saved))
}

/// Record the initial test outcome of a page.
///
/// New results may only use WCAG definitions valid on the date of test.
/// Existing results keep their definition even after it has expired.
/// Results not yet recorded are submitted with version 0.
pub async fn update_page_check_results(
    pool: &DbPool,
    user_id: i32,
    page_id: i32,
    request: &PageCheckResultsRequest,
) -> AppResult<Vec<check_result::Model>> {
    let txn = pool.begin().await?;
    let page = find_page(&txn, page_id).await?;
    let audit = find_audit(&txn, page.audit_id).await?;
    let case_id = audit.case_id;
    let existing = list_check_results_for_page(&txn, page_id).await?;
    let available: BTreeSet<i32> = valid_wcag_definitions(&txn, audit.date_of_test)
        .await?
        .into_iter()
        .map(|w| w.id)
        .collect();

    let mut changed = false;
    for input in &request.results {
        match existing
            .iter()
            .find(|r| r.wcag_definition_id == input.wcag_definition_id)
        {
            Some(current) => {
                check_version("Check result", current.id, current.version, input.version)?;
                let edited = check_result::Model {
                    check_result_state: input.check_result_state,
                    notes: input.notes.clone(),
                    ..current.clone()
                };
                changed |= save_versioned::<CheckResult, check_result::ActiveModel, _>(
                    &txn,
                    EntityRef::CheckResult(current.id),
                    Some(case_id),
                    Some(user_id),
                    current,
                    edited,
                    check_result::Column::Id,
                    check_result::Column::Version,
                )
                .await?
                .is_some();
            }
            None => {
                if input.version != 0 {
                    return Err(AppError::field(
                        "version",
                        format!(
                            "No check result exists for WCAG definition {} on page {}",
                            input.wcag_definition_id, page_id
                        ),
                    ));
                }
                if !available.contains(&input.wcag_definition_id) {
                    return Err(AppError::field(
                        "wcag_definition_id",
                        format!(
                            "WCAG definition {} is not available for a test on {}",
                            input.wcag_definition_id, audit.date_of_test
                        ),
                    ));
                }
                let now = Utc::now();
                let result = check_result::ActiveModel {
                    audit_id: Set(audit.id),
                    page_id: Set(page_id),
                    wcag_definition_id: Set(input.wcag_definition_id),
                    version: Set(1),
                    check_result_state: Set(input.check_result_state),
                    notes: Set(input.notes.clone()),
                    retest_state: Set(RetestState::NotRetested),
                    retest_notes: Set(String::new()),
                    created: Set(now),
                    updated: Set(now),
                    is_deleted: Set(false),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to create check result: {}", e)))?;
                record_create(
                    &txn,
                    EntityRef::CheckResult(result.id),
                    Some(case_id),
                    Some(user_id),
                    &result,
                )
                .await?;
                changed = true;
            }
        }
    }

    if let Some(complete_date) = request.complete_date
        && page.complete_date != Some(complete_date)
    {
        let edited = page::Model {
            complete_date: Some(complete_date),
            ..page.clone()
        };
        changed |= save_page(&txn, user_id, case_id, &page, edited).await?.is_some();
    }

    if changed {
        stamp_report_data_updated(&txn, audit.id).await?;
    }
    let results = list_check_results_for_page(&txn, page_id).await?;
    db::commit(txn).await?;
    Ok(results)
}

/// Record 12-week retest outcomes for a page's failed checks.
pub async fn update_page_retest(
    pool: &DbPool,
    user_id: i32,
    page_id: i32,
    request: &PageRetestRequest,
) -> AppResult<Vec<check_result::Model>> {
    let txn = pool.begin().await?;
    let page = find_page(&txn, page_id).await?;
    let audit = find_audit(&txn, page.audit_id).await?;
    let case_id = audit.case_id;

    let mut changed = false;
    for input in &request.results {
        let current = find_check_result(&txn, input.check_result_id).await?;
        if current.page_id != page_id {
            return Err(AppError::InvalidInput(format!(
                "Check result {} does not belong to page {}",
                current.id, page_id
            )));
        }
        if current.check_result_state != CheckResultState::Error {
            return Err(AppError::field(
                "retest_state",
                "Only checks that failed the initial test are retested",
            ));
        }
        check_version("Check result", current.id, current.version, input.version)?;
        let edited = check_result::Model {
            retest_state: input.retest_state,
            retest_notes: input.retest_notes.clone(),
            ..current.clone()
        };
        changed |= save_versioned::<CheckResult, check_result::ActiveModel, _>(
            &txn,
            EntityRef::CheckResult(current.id),
            Some(case_id),
            Some(user_id),
            &current,
            edited,
            check_result::Column::Id,
            check_result::Column::Version,
        )
        .await?
        .is_some();
    }

    if let Some(retest_complete_date) = request.retest_complete_date
        && page.retest_complete_date != Some(retest_complete_date)
    {
        let edited = page::Model {
            retest_complete_date: Some(retest_complete_date),
            ..page.clone()
        };
        changed |= save_page(&txn, user_id, case_id, &page, edited).await?.is_some();
    }

    if changed {
        stamp_report_data_updated(&txn, audit.id).await?;
    }
    let results = list_check_results_for_page(&txn, page_id).await?;
    db::commit(txn).await?;
    Ok(results)
}

/// Mark a page missing at the 12-week retest. Every failed check on a
/// missing page counts as not fixed.
pub async fn mark_page_missing(
    pool: &DbPool,
    user_id: i32,
    page_id: i32,
    request: &PageMissingRequest,
) -> AppResult<SaveOutcome<page::Model>> {
    let txn = pool.begin().await?;
    let current = find_page(&txn, page_id).await?;
    check_version("Page", page_id, current.version, request.version)?;
    let audit = find_audit(&txn, current.audit_id).await?;

    let edited = page::Model {
        retest_page_missing_date: request.missing_date,
        ..current.clone()
    };
    let saved = save_page(&txn, user_id, audit.case_id, &current, edited).await?;
    let mut changed = saved.is_some();

    if request.missing_date.is_some() {
        for result in list_check_results_for_page(&txn, page_id)
            .await?
            .into_iter()
            .filter(|r| r.is_failed())
        {
            let edited = check_result::Model {
                retest_state: RetestState::NotFixed,
                ..result.clone()
            };
            changed |= save_versioned::<CheckResult, check_result::ActiveModel, _>(
                &txn,
                EntityRef::CheckResult(result.id),
                Some(audit.case_id),
                Some(user_id),
                &result,
                edited,
                check_result::Column::Id,
                check_result::Column::Version,
            )
            .await?
            .is_some();
        }
    }

    if changed {
        stamp_report_data_updated(&txn, audit.id).await?;
        db::commit(txn).await?;
    }
    Ok(page_outcome(current, saved))
}

/// Update statement check results of an audit.
pub async fn update_statement_check_results(
    pool: &DbPool,
    user_id: i32,
    audit_id: i32,
    inputs: &[StatementCheckResultInput],
) -> AppResult<AuditData> {
    let txn = pool.begin().await?;
    let audit = find_audit(&txn, audit_id).await?;
    if !audit.uses_statement_checks {
        return Err(AppError::InvalidInput(format!(
            "Audit {} uses the legacy accessibility statement fields",
            audit_id
        )));
    }

    let mut changed = false;
    for input in inputs {
        let current = find_statement_check_result(&txn, input.statement_check_result_id).await?;
        if current.audit_id != audit_id {
            return Err(AppError::InvalidInput(format!(
                "Statement check result {} does not belong to audit {}",
                current.id, audit_id
            )));
        }
        check_version("Statement check result", current.id, current.version, input.version)?;

        let mut edited = current.clone();
        if let Some(state) = input.check_result_state {
            edited.check_result_state = state;
        }
        if let Some(comment) = &input.report_comment {
            edited.report_comment = comment.clone();
        }
        if let Some(state) = input.retest_state {
            edited.retest_state = state;
        }
        if let Some(comment) = &input.retest_comment {
            edited.retest_comment = comment.clone();
        }

        changed |= save_versioned::<StatementCheckResult, statement_check_result::ActiveModel, _>(
            &txn,
            EntityRef::StatementCheckResult(current.id),
            Some(audit.case_id),
            Some(user_id),
            &current,
            edited,
            statement_check_result::Column::Id,
            statement_check_result::Column::Version,
        )
        .await?
        .is_some();
    }

    if changed {
        stamp_report_data_updated(&txn, audit_id).await?;
    }
    let data = load_audit_data(&txn, audit_id).await?;
    db::commit(txn).await?;
    Ok(data)
}

/// Raise a custom statement issue with the next free issue number.
pub async fn add_custom_statement_issue(
    pool: &DbPool,
    user_id: i32,
    audit_id: i32,
    request: &CreateCustomStatementIssueRequest,
) -> AppResult<statement_check_result::Model> {
    if request.report_comment.trim().is_empty() {
        return Err(AppError::field("report_comment", "Describe the issue"));
    }

    let txn = pool.begin().await?;
    let audit = find_audit(&txn, audit_id).await?;
    let last = StatementCheckResult::find()
        .filter(statement_check_result::Column::AuditId.eq(audit_id))
        .order_by_desc(statement_check_result::Column::IssueNumber)
        .one(&txn)
        .await?;

    let result = statement_check_result::ActiveModel {
        audit_id: Set(audit_id),
        statement_check_id: Set(None),
        check_type: Set(StatementCheckType::Custom),
        issue_number: Set(last.map(|r| r.issue_number + 1).unwrap_or(1)),
        version: Set(1),
        check_result_state: Set(StatementCheckResultState::No),
        report_comment: Set(request.report_comment.trim().to_string()),
        retest_state: Set(StatementCheckResultState::NotTested),
        retest_comment: Set(String::new()),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::Database(format!("Failed to create statement issue: {}", e)))?;

    record_create(
        &txn,
        EntityRef::StatementCheckResult(result.id),
        Some(audit.case_id),
        Some(user_id),
        &result,
    )
    .await?;
    stamp_report_data_updated(&txn, audit_id).await?;
    db::commit(txn).await?;
    Ok(result)
}

pub async fn report_freshness(pool: &DbPool, case_id: i32) -> AppResult<ReportFreshness> {
    let conn = pool.connection();
    let audit = find_audit_for_case(conn, case_id).await?;
    let report = find_report_for_case(conn, case_id).await?;
    let latest = find_latest_published(conn, case_id).await?;
    Ok(freshness(audit.as_ref(), report.as_ref(), latest.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_statement_regime_by_date() {
        assert!(!uses_statement_checks_on(NaiveDate::from_ymd_opt(2022, 12, 31).unwrap()));
        assert!(uses_statement_checks_on(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()));
    }

    #[test]
    fn test_freshness_flags() {
        let rebuilt = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let report = report::Model {
            report_rebuilt: Some(rebuilt),
            ..Default::default()
        };
        let published = s3_report::Model {
            created: rebuilt + Duration::hours(1),
            ..Default::default()
        };

        let audit = audit::Model {
            unpublished_report_data_updated_time: Some(rebuilt - Duration::minutes(5)),
            published_report_data_updated_time: Some(rebuilt - Duration::minutes(5)),
            ..Default::default()
        };
        let flags = freshness(Some(&audit), Some(&report), Some(&published));
        assert!(!flags.draft_out_of_date);
        assert!(!flags.published_out_of_date);

        let audit = audit::Model {
            unpublished_report_data_updated_time: Some(rebuilt + Duration::hours(2)),
            published_report_data_updated_time: Some(rebuilt + Duration::hours(2)),
            ..Default::default()
        };
        let flags = freshness(Some(&audit), Some(&report), Some(&published));
        assert!(flags.draft_out_of_date);
        assert!(flags.published_out_of_date);
    }

    #[test]
    fn test_no_report_is_never_out_of_date() {
        let audit = audit::Model {
            unpublished_report_data_updated_time: Some(Utc::now()),
            ..Default::default()
        };
        let flags = freshness(Some(&audit), None, None);
        assert!(!flags.draft_out_of_date);
        assert!(!flags.published_out_of_date);
    }
}
