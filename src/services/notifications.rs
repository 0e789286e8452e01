//! Per-user tasks raised by case activity.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use sea_orm::*;
use tracing::info;

use crate::db::contacts::list_comments;
use crate::db::history::{record_create, record_update};
use crate::db::tasks::{find_reminder, find_task};
use crate::db::{self, DbPool};
use crate::entity::user::Entity as User;
use crate::entity::{case, comment, task};
use crate::error::{AppError, AppResult};
use crate::models::task::ReminderRequest;
use crate::models::{EntityRef, TaskType};
use crate::services::history::diff;

/// Users to notify about a new QA comment.
///
/// Everyone who has commented on the case, plus the auditor, the reviewer
/// and the active QA auditor, except the commenter.
pub fn qa_comment_recipients(
    previous_commenters: impl IntoIterator<Item = i32>,
    auditor_id: Option<i32>,
    reviewer_id: Option<i32>,
    active_qa_auditor_id: Option<i32>,
    commenter_id: i32,
) -> BTreeSet<i32> {
    let mut recipients: BTreeSet<i32> = previous_commenters.into_iter().collect();
    recipients.extend(auditor_id);
    recipients.extend(reviewer_id);
    recipients.extend(active_qa_auditor_id);
    recipients.remove(&commenter_id);
    recipients
}

async fn insert_task<C: ConnectionTrait>(
    conn: &C,
    task_type: TaskType,
    user_id: i32,
    case: &case::Model,
    date: NaiveDate,
    description: String,
) -> AppResult<task::Model> {
    let now = Utc::now();
    let task = task::ActiveModel {
        task_type: Set(task_type),
        user_id: Set(user_id),
        case_id: Set(case.id),
        date: Set(date),
        description: Set(description),
        list_description: Set(format!("{} | {}", case.organisation_name, task_type.label())),
        read: Set(false),
        created: Set(now),
        updated: Set(now),
        is_deleted: Set(false),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| AppError::Database(format!("Failed to create task: {}", e)))?;

    record_create(conn, EntityRef::Task(task.id), Some(case.id), None, &task).await?;
    Ok(task)
}

/// Raise one `qa-comment` task per recipient of a new comment.
pub async fn create_qa_comment_tasks<C: ConnectionTrait>(
    conn: &C,
    case: &case::Model,
    comment: &comment::Model,
    active_qa_auditor_id: Option<i32>,
) -> AppResult<Vec<task::Model>> {
    let commenters = list_comments(conn, case.id).await?.into_iter().map(|c| c.user_id);
    let recipients = qa_comment_recipients(
        commenters,
        case.auditor_id,
        case.reviewer_id,
        active_qa_auditor_id,
        comment.user_id,
    );

    let author = User::find_by_id(comment.user_id)
        .one(conn)
        .await?
        .map(|u| u.full_name())
        .unwrap_or_else(|| "Someone".to_string());

    let today = Utc::now().date_naive();
    let mut tasks = Vec::with_capacity(recipients.len());
    for user_id in recipients {
        let description = format!("{} left a message in discussion:\n\n{}", author, comment.body);
        tasks.push(insert_task(conn, TaskType::QaComment, user_id, case, today, description).await?);
    }

    info!(
        case_id = case.id,
        comment_id = comment.id,
        tasks = tasks.len(),
        "Created QA comment tasks"
    );
    Ok(tasks)
}

/// Tell the auditor their report was approved, unless they approved it.
pub async fn create_report_approved_task<C: ConnectionTrait>(
    conn: &C,
    case: &case::Model,
    approver_id: i32,
) -> AppResult<Option<task::Model>> {
    match case.auditor_id {
        Some(auditor_id) if auditor_id != approver_id => {
            let description = format!("Report for {} has been approved", case.case_identifier);
            let today = Utc::now().date_naive();
            let task = insert_task(
                conn,
                TaskType::ReportApproved,
                auditor_id,
                case,
                today,
                description,
            )
            .await?;
            Ok(Some(task))
        }
        _ => Ok(None),
    }
}

/// Mark a task read. Marking an already read task is a no-op.
pub async fn mark_task_read(pool: &DbPool, user_id: i32, task_id: i32) -> AppResult<task::Model> {
    let current = pool.get_task(task_id).await?;
    if current.user_id != user_id {
        return Err(AppError::PermissionDenied(
            "Tasks can only be marked read by their owner".to_string(),
        ));
    }
    if current.read {
        return Ok(current);
    }

    let txn = pool.begin().await?;
    let mut edited = current.clone();
    edited.read = true;
    let difference = diff(&current, &edited)?;

    let mut active: task::ActiveModel = current.into();
    active.read = Set(true);
    active.updated = Set(Utc::now());
    let updated = active.update(&txn).await?;
    record_update(
        &txn,
        EntityRef::Task(task_id),
        Some(updated.case_id),
        Some(user_id),
        difference,
    )
    .await?;
    db::commit(txn).await?;
    Ok(updated)
}

/// Create the user's reminder for a case, or replace the existing one.
pub async fn set_reminder(
    pool: &DbPool,
    user_id: i32,
    case_id: i32,
    request: &ReminderRequest,
) -> AppResult<task::Model> {
    if request.description.trim().is_empty() {
        return Err(AppError::field("description", "Enter a description"));
    }

    let txn = pool.begin().await?;
    let case = db::cases::find_case(&txn, case_id).await?;

    let task = match find_reminder(&txn, user_id, case_id).await? {
        Some(existing) => {
            let mut edited = existing.clone();
            edited.date = request.date;
            edited.description = request.description.clone();
            let difference = diff(&existing, &edited)?;
            if difference.is_empty() {
                return Ok(existing);
            }
            let mut active: task::ActiveModel = existing.into();
            active.date = Set(request.date);
            active.description = Set(request.description.clone());
            active.updated = Set(Utc::now());
            let updated = active.update(&txn).await?;
            record_update(&txn, EntityRef::Task(updated.id), Some(case_id), Some(user_id), difference)
                .await?;
            updated
        }
        None => {
            insert_task(
                &txn,
                TaskType::Reminder,
                user_id,
                &case,
                request.date,
                request.description.clone(),
            )
            .await?
        }
    };

    db::commit(txn).await?;
    Ok(task)
}

/// Soft-delete one of the user's reminders.
pub async fn delete_reminder(pool: &DbPool, user_id: i32, task_id: i32) -> AppResult<()> {
    let txn = pool.begin().await?;
    let task = find_task(&txn, task_id).await?;
    if task.user_id != user_id || task.task_type != TaskType::Reminder {
        return Err(AppError::PermissionDenied(
            "Only your own reminders can be deleted".to_string(),
        ));
    }

    let mut edited = task.clone();
    edited.is_deleted = true;
    let difference = diff(&task, &edited)?;
    let mut active: task::ActiveModel = task.into();
    active.is_deleted = Set(true);
    active.updated = Set(Utc::now());
    let deleted = active.update(&txn).await?;
    record_update(&txn, EntityRef::Task(task_id), Some(deleted.case_id), Some(user_id), difference)
        .await?;
    db::commit(txn).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipients_exclude_commenter() {
        let recipients = qa_comment_recipients(vec![2, 3, 2], Some(1), Some(4), Some(5), 3);
        assert_eq!(recipients.into_iter().collect::<Vec<_>>(), vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_recipients_deduplicate_roles() {
        let recipients = qa_comment_recipients(Vec::new(), Some(1), Some(1), Some(1), 9);
        assert_eq!(recipients.len(), 1);
    }

    #[test]
    fn test_auditor_commenting_on_own_case_is_not_notified() {
        let recipients = qa_comment_recipients(vec![1], Some(1), None, None, 1);
        assert!(recipients.is_empty());
    }
}
