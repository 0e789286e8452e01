//! Case endpoints.

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use super::{PageQuery, VersionBody, VersionQuery, with_next_page};
use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{
    CaseListQuery, CaseSummary, CreateCaseRequest, DeactivateCaseRequest, DueDateOverride,
    Pagination, VersionedUpdate,
};
use crate::services::case_workflow;
use crate::services::scheduler;
use crate::services::url_check::PreviousCaseCheck;

#[derive(Serialize, ToSchema)]
pub struct CaseListResponse {
    pub cases: Vec<CaseSummary>,
    pub pagination: Pagination,
}

/// Note: more specific routes must be registered before generic ones.
pub fn configure_case_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_cases)
        .service(create_case)
        .service(case_history)
        .service(case_events)
        .service(case_status)
        .service(case_overdue)
        .service(override_due_dates)
        .service(deactivate_case)
        .service(reactivate_case)
        .service(get_case)
        .service(update_case)
        .service(delete_case);
}

/// List cases with filters and pagination.
#[utoipa::path(
    get,
    path = "/api/v1/cases",
    tag = "Cases",
    params(
        ("status" = Option<String>, Query, description = "Case status"),
        ("variant" = Option<String>, Query, description = "Case variant"),
        ("auditor_id" = Option<i32>, Query, description = "Auditor"),
        ("reviewer_id" = Option<i32>, Query, description = "QA reviewer"),
        ("search" = Option<String>, Query, description = "Organisation, domain or identifier"),
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 100, max: 100)")
    ),
    responses(
        (status = 200, description = "Matching cases", body = CaseListResponse)
    )
)]
#[get("/cases")]
pub async fn list_cases(
    pool: web::Data<DbPool>,
    query: web::Query<CaseListQuery>,
) -> AppResult<HttpResponse> {
    let (cases, pagination) = pool.list_cases(&query).await?;
    Ok(HttpResponse::Ok().json(CaseListResponse { cases, pagination }))
}

/// Create a case.
#[utoipa::path(
    post,
    path = "/api/v1/cases",
    tag = "Cases",
    request_body = CreateCaseRequest,
    responses(
        (status = 201, description = "Case created"),
        (status = 422, description = "Validation failed", body = crate::error::ErrorResponse)
    )
)]
#[post("/cases")]
pub async fn create_case(
    pool: web::Data<DbPool>,
    previous_case: web::Data<PreviousCaseCheck>,
    user: CurrentUser,
    body: web::Json<CreateCaseRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    previous_case.validate(&pool, &request.previous_case_url).await?;
    let case = case_workflow::create_case(&pool, user.id(), request).await?;
    Ok(HttpResponse::Created().json(case))
}

#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}",
    tag = "Cases",
    params(("id" = i32, Path, description = "Case id")),
    responses(
        (status = 200, description = "Case"),
        (status = 404, description = "Case not found", body = crate::error::ErrorResponse)
    )
)]
#[get("/cases/{id}")]
pub async fn get_case(pool: web::Data<DbPool>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.get_case(path.into_inner()).await?))
}

/// Partially update a case.
///
/// Fails with 409 when `version` is not the stored version.
#[utoipa::path(
    patch,
    path = "/api/v1/cases/{id}",
    tag = "Cases",
    params(
        ("id" = i32, Path, description = "Case id"),
        ("page_url" = Option<String>, Query, description = "Workflow page the save came from")
    ),
    request_body = VersionedUpdate,
    responses(
        (status = 200, description = "Save outcome"),
        (status = 409, description = "Stale version", body = crate::error::ErrorResponse),
        (status = 422, description = "Validation failed", body = crate::error::ErrorResponse)
    )
)]
#[patch("/cases/{id}")]
pub async fn update_case(
    pool: web::Data<DbPool>,
    previous_case: web::Data<PreviousCaseCheck>,
    user: CurrentUser,
    path: web::Path<i32>,
    page: web::Query<PageQuery>,
    body: web::Json<VersionedUpdate>,
) -> AppResult<HttpResponse> {
    if let Some(url) = body.fields.get("previous_case_url").and_then(|v| v.as_str()) {
        previous_case.validate(&pool, url).await?;
    }
    let outcome = case_workflow::update_case(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(with_next_page(&pool, outcome, &page).await?))
}

/// Soft-delete a case.
#[utoipa::path(
    delete,
    path = "/api/v1/cases/{id}",
    tag = "Cases",
    params(
        ("id" = i32, Path, description = "Case id"),
        ("version" = i32, Query, description = "Version the client read")
    ),
    responses((status = 200, description = "Case deleted"))
)]
#[delete("/cases/{id}")]
pub async fn delete_case(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    query: web::Query<VersionQuery>,
) -> AppResult<HttpResponse> {
    let outcome =
        case_workflow::delete_case(&pool, user.id(), path.into_inner(), query.version).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Override the scheduler's follow-up due dates.
#[utoipa::path(
    put,
    path = "/api/v1/cases/{id}/due-dates",
    tag = "Cases",
    params(("id" = i32, Path, description = "Case id")),
    request_body = DueDateOverride,
    responses((status = 200, description = "Save outcome"))
)]
#[put("/cases/{id}/due-dates")]
pub async fn override_due_dates(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<DueDateOverride>,
) -> AppResult<HttpResponse> {
    let outcome =
        case_workflow::override_due_dates(&pool, user.id(), path.into_inner(), body.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/v1/cases/{id}/deactivate",
    tag = "Cases",
    params(("id" = i32, Path, description = "Case id")),
    request_body = DeactivateCaseRequest,
    responses((status = 200, description = "Save outcome"))
)]
#[post("/cases/{id}/deactivate")]
pub async fn deactivate_case(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<DeactivateCaseRequest>,
) -> AppResult<HttpResponse> {
    let outcome =
        case_workflow::deactivate_case(&pool, user.id(), path.into_inner(), body.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/v1/cases/{id}/reactivate",
    tag = "Cases",
    params(("id" = i32, Path, description = "Case id")),
    request_body = VersionBody,
    responses((status = 200, description = "Save outcome"))
)]
#[post("/cases/{id}/reactivate")]
pub async fn reactivate_case(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<VersionBody>,
) -> AppResult<HttpResponse> {
    let outcome =
        case_workflow::reactivate_case(&pool, user.id(), path.into_inner(), body.version).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Field-level history of the case and its children, with case events.
#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/history",
    tag = "Cases",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "History entries, oldest first", body = Vec<crate::models::case::CaseHistoryEntry>))
)]
#[get("/cases/{id}/history")]
pub async fn case_history(pool: web::Data<DbPool>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    pool.get_case(id).await?;
    Ok(HttpResponse::Ok().json(case_workflow::case_history(&pool, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/events",
    tag = "Cases",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "Case events, oldest first"))
)]
#[get("/cases/{id}/events")]
pub async fn case_events(pool: web::Data<DbPool>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_case_events(path.into_inner()).await?))
}

/// Status derived from today's date, without saving it.
#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/status",
    tag = "Cases",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "Derived status", body = crate::models::CaseStatus))
)]
#[get("/cases/{id}/status")]
pub async fn case_status(pool: web::Data<DbPool>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    let status = case_workflow::current_status(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": status,
        "label": status.label(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/overdue",
    tag = "Cases",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "Overdue chasers", body = Vec<scheduler::OverdueItem>))
)]
#[get("/cases/{id}/overdue")]
pub async fn case_overdue(pool: web::Data<DbPool>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    let case = pool.get_case(path.into_inner()).await?;
    let today = Utc::now().date_naive();
    Ok(HttpResponse::Ok().json(scheduler::overdue_items(&case, today)))
}
