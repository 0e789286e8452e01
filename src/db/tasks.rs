//! Database operations for tasks.

use chrono::NaiveDate;
use sea_orm::*;

use crate::entity::case::{self, Entity as Case};
use crate::entity::task::{self, Entity as Task};
use crate::error::{AppError, AppResult};
use crate::models::{CaseVariant, TaskType};
use crate::models::task::TaskListQuery;

use super::DbPool;

pub async fn find_task<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<task::Model> {
    Task::find_by_id(id)
        .filter(task::Column::IsDeleted.eq(false))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load task {}: {}", id, e)))?
        .ok_or_else(|| AppError::NotFound(format!("Task {}", id)))
}

/// The live reminder a user holds for a case, if any.
pub async fn find_reminder<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    case_id: i32,
) -> AppResult<Option<task::Model>> {
    Task::find()
        .filter(task::Column::TaskType.eq(TaskType::Reminder))
        .filter(task::Column::UserId.eq(user_id))
        .filter(task::Column::CaseId.eq(case_id))
        .filter(task::Column::IsDeleted.eq(false))
        .filter(task::Column::Read.eq(false))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load reminder: {}", e)))
}

impl DbPool {
    pub async fn get_task(&self, id: i32) -> AppResult<task::Model> {
        find_task(self.connection(), id).await
    }

    /// A user's tasks: unread first, then by date.
    pub async fn list_tasks_for_user(
        &self,
        user_id: i32,
        query: &TaskListQuery,
    ) -> AppResult<Vec<task::Model>> {
        let mut select = Task::find()
            .filter(task::Column::UserId.eq(user_id))
            .filter(task::Column::IsDeleted.eq(false));
        if let Some(task_type) = query.task_type {
            select = select.filter(task::Column::TaskType.eq(task_type));
        }
        if !query.include_read {
            select = select.filter(task::Column::Read.eq(false));
        }
        let mut tasks = select
            .order_by_asc(task::Column::Date)
            .order_by_asc(task::Column::Id)
            .all(self.connection())
            .await?;
        tasks.sort_by_key(|t| t.read);
        Ok(tasks)
    }

    /// Unread reminders due on `date` whose case has an auditor.
    pub async fn list_due_reminders(&self, date: NaiveDate) -> AppResult<Vec<task::Model>> {
        let tasks = Task::find()
            .filter(task::Column::TaskType.eq(TaskType::Reminder))
            .filter(task::Column::Date.eq(date))
            .filter(task::Column::Read.eq(false))
            .filter(task::Column::IsDeleted.eq(false))
            .inner_join(Case)
            .filter(case::Column::AuditorId.is_not_null())
            .filter(case::Column::IsDeleted.eq(false))
            .order_by_asc(task::Column::UserId)
            .order_by_asc(task::Column::Id)
            .all(self.connection())
            .await?;
        Ok(tasks)
    }

    /// Unread reminders due on or before `date` that belong to the auditor of
    /// a detailed case.
    pub async fn list_weekly_digest_reminders(&self, date: NaiveDate) -> AppResult<Vec<task::Model>> {
        let rows = Task::find()
            .filter(task::Column::TaskType.eq(TaskType::Reminder))
            .filter(task::Column::Date.lte(date))
            .filter(task::Column::Read.eq(false))
            .filter(task::Column::IsDeleted.eq(false))
            .find_also_related(Case)
            .filter(case::Column::Variant.eq(CaseVariant::Detailed))
            .filter(case::Column::IsDeleted.eq(false))
            .order_by_asc(task::Column::UserId)
            .order_by_asc(task::Column::Date)
            .order_by_asc(task::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list digest reminders: {}", e)))?;
        Ok(rows
            .into_iter()
            .filter_map(|(task, case)| match case {
                Some(case) if case.auditor_id == Some(task.user_id) => Some(task),
                _ => None,
            })
            .collect())
    }
}
