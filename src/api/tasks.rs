//! Task, reminder and notification setting endpoints.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::task::{ReminderRequest, TaskListQuery};
use crate::services::notifications;

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmailNotificationsRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmailNotificationsResponse {
    pub user_id: i32,
    pub enabled: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActiveQaAuditorRequest {
    pub user_id: Option<i32>,
}

pub fn configure_task_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_tasks)
        .service(mark_task_read)
        .service(set_reminder)
        .service(delete_reminder)
        .service(get_email_notifications)
        .service(set_email_notifications)
        .service(list_users)
        .service(get_platform)
        .service(set_active_qa_auditor);
}

/// Tasks of the acting user.
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    tag = "Tasks",
    params(
        ("type" = Option<String>, Query, description = "Task type"),
        ("include_read" = Option<bool>, Query, description = "Include read tasks")
    ),
    responses((status = 200, description = "Tasks"))
)]
#[get("/tasks")]
pub async fn list_tasks(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    query: web::Query<TaskListQuery>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_tasks_for_user(user.id(), &query).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/read",
    tag = "Tasks",
    params(("id" = i32, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task marked read"),
        (status = 403, description = "Task belongs to another user", body = crate::error::ErrorResponse)
    )
)]
#[post("/tasks/{id}/read")]
pub async fn mark_task_read(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let task = notifications::mark_task_read(&pool, user.id(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Create or replace the acting user's reminder for a case.
#[utoipa::path(
    put,
    path = "/api/v1/cases/{id}/reminder",
    tag = "Tasks",
    params(("id" = i32, Path, description = "Case id")),
    request_body = ReminderRequest,
    responses((status = 200, description = "Reminder task"))
)]
#[put("/cases/{id}/reminder")]
pub async fn set_reminder(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<ReminderRequest>,
) -> AppResult<HttpResponse> {
    let task = notifications::set_reminder(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(task))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}/reminder",
    tag = "Tasks",
    params(("id" = i32, Path, description = "Reminder task id")),
    responses((status = 204, description = "Reminder deleted"))
)]
#[delete("/tasks/{id}/reminder")]
pub async fn delete_reminder(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    notifications::delete_reminder(&pool, user.id(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me/email-notifications",
    tag = "Tasks",
    responses((status = 200, description = "Email notification setting", body = EmailNotificationsResponse))
)]
#[get("/users/me/email-notifications")]
pub async fn get_email_notifications(
    pool: web::Data<DbPool>,
    user: CurrentUser,
) -> AppResult<HttpResponse> {
    let enabled = pool.email_notifications_enabled(user.id()).await?;
    Ok(HttpResponse::Ok().json(EmailNotificationsResponse {
        user_id: user.id(),
        enabled,
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/me/email-notifications",
    tag = "Tasks",
    request_body = EmailNotificationsRequest,
    responses((status = 200, description = "Email notification setting", body = EmailNotificationsResponse))
)]
#[put("/users/me/email-notifications")]
pub async fn set_email_notifications(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    body: web::Json<EmailNotificationsRequest>,
) -> AppResult<HttpResponse> {
    pool.set_email_notifications(user.id(), body.enabled).await?;
    Ok(HttpResponse::Ok().json(EmailNotificationsResponse {
        user_id: user.id(),
        enabled: body.enabled,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Tasks",
    responses((status = 200, description = "Users"))
)]
#[get("/users")]
pub async fn list_users(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_users().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/platform",
    tag = "Tasks",
    responses((status = 200, description = "Platform settings"))
)]
#[get("/platform")]
pub async fn get_platform(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.get_platform().await?))
}

/// Choose the QA auditor notified of every QA comment.
#[utoipa::path(
    put,
    path = "/api/v1/platform/active-qa-auditor",
    tag = "Tasks",
    request_body = ActiveQaAuditorRequest,
    responses((status = 200, description = "Platform settings"))
)]
#[put("/platform/active-qa-auditor")]
pub async fn set_active_qa_auditor(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    body: web::Json<ActiveQaAuditorRequest>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.set_active_qa_auditor(body.user_id).await?))
}
