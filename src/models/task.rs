//! Task (notification) enums and DTOs.

use chrono::NaiveDate;
use sea_orm::sea_query::StringLen;
use serde::Deserialize;
use utoipa::ToSchema;

choice_enum! {
    pub enum TaskType {
        QaComment => "qa-comment", "QA comment",
        ReportApproved => "report-approved", "Report approved",
        Reminder => "reminder", "Reminder",
        Postcase => "postcase", "Post case",
        Overdue => "overdue", "Overdue",
    }
}

/// Create or replace the reminder a user holds for a case.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReminderRequest {
    pub date: NaiveDate,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TaskListQuery {
    #[serde(rename = "type")]
    pub task_type: Option<TaskType>,
    #[serde(default)]
    pub include_read: bool,
}
