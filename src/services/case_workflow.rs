//! Case lifecycle: creation, versioned updates, due-date overrides,
//! deactivation and soft deletion.
//!
//! Every write recomputes the domain and the derived status, records a field
//! difference and bumps the version inside one transaction.

use chrono::Utc;
use sea_orm::*;
use serde_json::{Map, Value};
use tracing::info;

use crate::db::cases::{find_audit_for_case, find_case, next_case_number};
use crate::db::history::{record_case_event, record_create};
use crate::db::{self, DbPool, check_version, save_versioned};
use crate::entity::case::{self, Entity as Case};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::case::{CreateCaseRequest, DeactivateCaseRequest, DueDateOverride};
use crate::models::{
    CaseEventType, CaseHistoryEntry, CaseStatus, EntityRef, ReportApprovedStatus, SaveOutcome,
    VersionedUpdate,
};
use crate::services::history::{apply_patch, changed};
use crate::services::identifiers::extract_domain;
use crate::services::notifications::create_report_approved_task;
use crate::services::scheduler::{DUE_DATE_FIELDS, apply_schedule};
use crate::services::status::{derive_status, transition_message};

/// Fields maintained by the workflow itself.
const CASE_PROTECTED: &[&str] = &[
    "case_number",
    "variant",
    "case_identifier",
    "status",
    "domain",
    "created_by_id",
    "is_deactivated",
    "deactivate_date",
    "is_deleted",
];

fn validate_case(case: &case::Model) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if case.organisation_name.trim().is_empty() {
        errors
            .entry("organisation_name".to_string())
            .or_default()
            .push("Enter the organisation name".to_string());
    }
    if !case.home_page_url.is_empty() && extract_domain(&case.home_page_url).is_none() {
        errors
            .entry("home_page_url".to_string())
            .or_default()
            .push("Enter a valid URL".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Create a case with the next number for its variant.
pub async fn create_case(
    pool: &DbPool,
    user_id: i32,
    request: CreateCaseRequest,
) -> AppResult<case::Model> {
    if request.home_page_url.trim().is_empty() {
        return Err(AppError::field("home_page_url", "Enter the home page URL"));
    }

    let txn = pool.begin().await?;
    let case_number = next_case_number(&txn, request.variant).await?;
    let now = Utc::now();

    let mut model = case::Model {
        case_number,
        variant: request.variant,
        case_identifier: request.variant.case_identifier(case_number),
        version: 1,
        created: now,
        updated: now,
        created_by_id: Some(user_id),
        organisation_name: request.organisation_name.trim().to_string(),
        website_name: request.website_name,
        home_page_url: request.home_page_url.trim().to_string(),
        enforcement_body: request.enforcement_body,
        psb_location: request.psb_location,
        sector_id: request.sector_id,
        subcategory_id: request.subcategory_id,
        is_complaint: request.is_complaint,
        previous_case_url: request.previous_case_url,
        notes: request.notes,
        auditor_id: request.auditor_id,
        ..Default::default()
    };
    validate_case(&model)?;
    model.domain = extract_domain(&model.home_page_url).unwrap_or_default();
    model.status = derive_status(&model, None, now.date_naive());

    let mut active: case::ActiveModel = model.into();
    active.id = NotSet;
    let created = active
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create case: {}", e)))?;

    record_create(&txn, EntityRef::Case(created.id), Some(created.id), Some(user_id), &created)
        .await?;
    record_case_event(
        &txn,
        created.id,
        CaseEventType::Create,
        format!("Created case {}", created.case_identifier),
        Some(user_id),
    )
    .await?;
    if let Some(auditor_id) = created.auditor_id {
        record_case_event(
            &txn,
            created.id,
            CaseEventType::Auditor,
            format!("Auditor set to user {}", auditor_id),
            Some(user_id),
        )
        .await?;
    }

    db::commit(txn).await?;
    info!(case_id = created.id, case_identifier = %created.case_identifier, "Case created");
    Ok(created)
}

/// Persist an edited case: domain, status, history and case events.
///
/// `current` is the stored row. Returns an unchanged outcome when the edit
/// is a no-op.
async fn save_case<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    current: &case::Model,
    mut edited: case::Model,
) -> AppResult<SaveOutcome<case::Model>> {
    validate_case(&edited)?;
    edited.domain = extract_domain(&edited.home_page_url).unwrap_or_default();

    if crate::services::history::diff(current, &edited)?.is_empty() {
        return Ok(SaveOutcome {
            instance: current.clone(),
            changed: false,
            messages: Vec::new(),
            next_page_url: None,
        });
    }

    let audit = find_audit_for_case(conn, current.id).await?;
    edited.status = derive_status(&edited, audit.as_ref(), Utc::now().date_naive());

    let saved = save_versioned::<Case, case::ActiveModel, C>(
        conn,
        EntityRef::Case(current.id),
        Some(current.id),
        Some(user_id),
        current,
        edited,
        case::Column::Id,
        case::Column::Version,
    )
    .await?
    .ok_or_else(|| AppError::Database("Case save produced no change".to_string()))?;

    let mut messages = Vec::new();
    let case = saved.model;

    if current.status != case.status {
        let message = transition_message(current.status, case.status);
        record_case_event(conn, case.id, CaseEventType::Status, message.clone(), Some(user_id))
            .await?;
        messages.push(message);
    }
    if changed(&saved.difference, "auditor_id") {
        record_case_event(
            conn,
            case.id,
            CaseEventType::Auditor,
            match case.auditor_id {
                Some(id) => format!("Auditor set to user {}", id),
                None => "Auditor removed".to_string(),
            },
            Some(user_id),
        )
        .await?;
    }
    if changed(&saved.difference, "reviewer_id") {
        record_case_event(
            conn,
            case.id,
            CaseEventType::QaAuditor,
            match case.reviewer_id {
                Some(id) => format!("QA auditor set to user {}", id),
                None => "QA auditor removed".to_string(),
            },
            Some(user_id),
        )
        .await?;
    }
    if changed(&saved.difference, "report_approved_status")
        && case.report_approved_status == ReportApprovedStatus::Approved
    {
        record_case_event(
            conn,
            case.id,
            CaseEventType::ApproveReport,
            "Report approved",
            Some(user_id),
        )
        .await?;
        create_report_approved_task(conn, &case, user_id).await?;
    }

    info!(
        case_id = case.id,
        user_id,
        version = case.version,
        fields = saved.difference.len(),
        "Case updated"
    );

    Ok(SaveOutcome {
        instance: case,
        changed: true,
        messages,
        next_page_url: None,
    })
}

/// Apply a partial update to a case.
///
/// Due dates cannot be edited here; they follow their trigger dates unless
/// overridden through [`override_due_dates`].
pub async fn update_case(
    pool: &DbPool,
    user_id: i32,
    case_id: i32,
    update: &VersionedUpdate,
) -> AppResult<SaveOutcome<case::Model>> {
    let txn = pool.begin().await?;
    let current = find_case(&txn, case_id).await?;
    check_version("Case", case_id, current.version, update.version)?;

    let protected: Vec<&str> = CASE_PROTECTED.iter().chain(DUE_DATE_FIELDS).copied().collect();
    let mut edited: case::Model = apply_patch(&current, &update.fields, &protected)?;
    apply_schedule(&current, &mut edited);

    let outcome = save_case(&txn, user_id, &current, edited).await?;
    if outcome.changed {
        db::commit(txn).await?;
    }
    Ok(outcome)
}

/// Set scheduler-maintained due dates by hand. Trigger dates are untouched
/// and nothing is recomputed.
pub async fn override_due_dates(
    pool: &DbPool,
    user_id: i32,
    case_id: i32,
    request: DueDateOverride,
) -> AppResult<SaveOutcome<case::Model>> {
    let txn = pool.begin().await?;
    let current = find_case(&txn, case_id).await?;
    check_version("Case", case_id, current.version, request.version)?;

    let fields: Map<String, Value> = request.into_fields();
    let edited: case::Model = apply_patch(&current, &fields, CASE_PROTECTED)?;
    let outcome = save_case(&txn, user_id, &current, edited).await?;
    if outcome.changed {
        db::commit(txn).await?;
    }
    Ok(outcome)
}

pub async fn deactivate_case(
    pool: &DbPool,
    user_id: i32,
    case_id: i32,
    request: DeactivateCaseRequest,
) -> AppResult<SaveOutcome<case::Model>> {
    let txn = pool.begin().await?;
    let current = find_case(&txn, case_id).await?;
    check_version("Case", case_id, current.version, request.version)?;

    let edited = case::Model {
        is_deactivated: true,
        deactivate_date: Some(Utc::now().date_naive()),
        deactivate_notes: request.deactivate_notes,
        ..current.clone()
    };
    let outcome = save_case(&txn, user_id, &current, edited).await?;
    if outcome.changed {
        db::commit(txn).await?;
    }
    Ok(outcome)
}

pub async fn reactivate_case(
    pool: &DbPool,
    user_id: i32,
    case_id: i32,
    version: i32,
) -> AppResult<SaveOutcome<case::Model>> {
    let txn = pool.begin().await?;
    let current = find_case(&txn, case_id).await?;
    check_version("Case", case_id, current.version, version)?;

    let edited = case::Model {
        is_deactivated: false,
        deactivate_date: None,
        ..current.clone()
    };
    let outcome = save_case(&txn, user_id, &current, edited).await?;
    if outcome.changed {
        db::commit(txn).await?;
    }
    Ok(outcome)
}

/// Soft-delete a case. Its children stay in place and inherit the deletion.
pub async fn delete_case(
    pool: &DbPool,
    user_id: i32,
    case_id: i32,
    version: i32,
) -> AppResult<SaveOutcome<case::Model>> {
    let txn = pool.begin().await?;
    let current = find_case(&txn, case_id).await?;
    check_version("Case", case_id, current.version, version)?;

    let edited = case::Model {
        is_deleted: true,
        ..current.clone()
    };
    let outcome = save_case(&txn, user_id, &current, edited).await?;
    if outcome.changed {
        db::commit(txn).await?;
    }
    Ok(outcome)
}

/// Recompute the cached status after a change elsewhere in the aggregate.
///
/// The cache is not part of the case's editable state, so the version is
/// not bumped. A transition still appends a status case event.
pub async fn refresh_case_status<C: ConnectionTrait>(
    conn: &C,
    case_id: i32,
    user_id: Option<i32>,
) -> AppResult<Option<String>> {
    let case = find_case(conn, case_id).await?;
    let audit = find_audit_for_case(conn, case_id).await?;
    let status = derive_status(&case, audit.as_ref(), Utc::now().date_naive());
    if status == case.status {
        return Ok(None);
    }

    let previous = case.status;
    let mut active: case::ActiveModel = case.into();
    active.status = Set(status);
    active.update(conn).await.map_err(|e| {
        AppError::Database(format!("Failed to refresh status of case {}: {}", case_id, e))
    })?;

    let message = transition_message(previous, status);
    record_case_event(conn, case_id, CaseEventType::Status, message.clone(), user_id).await?;
    info!(case_id, from = %previous, to = %status, "Case status changed");
    Ok(Some(message))
}

/// Refresh every active case's cached status, for date-driven transitions.
///
/// Returns the number of cases whose status changed.
pub async fn refresh_all_statuses(pool: &DbPool) -> AppResult<usize> {
    let mut changed = 0;
    for case in pool.list_active_cases().await? {
        let txn = pool.begin().await?;
        if refresh_case_status(&txn, case.id, None).await?.is_some() {
            changed += 1;
        }
        db::commit(txn).await?;
    }
    Ok(changed)
}

/// Event history and case events of a case, oldest first.
pub async fn case_history(pool: &DbPool, case_id: i32) -> AppResult<Vec<CaseHistoryEntry>> {
    pool.get_case(case_id).await?;

    let mut entries: Vec<CaseHistoryEntry> = pool
        .list_case_history(case_id)
        .await?
        .into_iter()
        .map(|event| {
            let entity = event.entity();
            CaseHistoryEntry {
                created: event.created,
                kind: event.event_type.as_str().to_string(),
                author_id: event.author_id,
                summary: format!(
                    "{} {} #{}",
                    event.event_type.label(),
                    entity.entity_type().label(),
                    entity.id()
                ),
                detail: event.difference,
            }
        })
        .collect();

    entries.extend(pool.list_case_events(case_id).await?.into_iter().map(|event| {
        CaseHistoryEntry {
            created: event.created,
            kind: format!("case_event:{}", event.event_type),
            author_id: event.done_by_id,
            summary: event.message,
            detail: Value::Null,
        }
    }));

    entries.sort_by_key(|e| e.created);
    Ok(entries)
}

/// Status of a case as it would be derived right now.
pub async fn current_status(pool: &DbPool, case_id: i32) -> AppResult<CaseStatus> {
    let case = pool.get_case(case_id).await?;
    let audit = pool.get_audit_for_case(case_id).await?;
    Ok(derive_status(&case, audit.as_ref(), Utc::now().date_naive()))
}
