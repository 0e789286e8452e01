//! Audit, page and check result endpoints.

use actix_web::{HttpResponse, delete, get, patch, post, put, web};

use super::{PageQuery, VersionQuery, with_next_page};
use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::VersionedUpdate;
use crate::models::audit::{
    CreateAuditRequest, CreateCustomStatementIssueRequest, CreatePageRequest,
    PageCheckResultsRequest, PageMissingRequest, PageRetestRequest, ReportFreshness,
    StatementCheckResultInput,
};
use crate::services::audit;

pub fn configure_audit_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_audit)
        .service(report_freshness)
        .service(get_audit)
        .service(update_audit)
        .service(add_page)
        .service(update_statement_check_results)
        .service(add_custom_statement_issue)
        .service(update_page_check_results)
        .service(update_page_retest)
        .service(mark_page_missing)
        .service(update_page)
        .service(delete_page);
}

/// Start the initial test of a case.
#[utoipa::path(
    post,
    path = "/api/v1/cases/{id}/audit",
    tag = "Audits",
    params(("id" = i32, Path, description = "Case id")),
    request_body = CreateAuditRequest,
    responses(
        (status = 201, description = "Audit created"),
        (status = 422, description = "Case already has an audit", body = crate::error::ErrorResponse)
    )
)]
#[post("/cases/{id}/audit")]
pub async fn create_audit(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<CreateAuditRequest>,
) -> AppResult<HttpResponse> {
    let audit = audit::create_audit(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Created().json(audit))
}

/// Audit with its pages, check results and statement checks.
#[utoipa::path(
    get,
    path = "/api/v1/audits/{id}",
    tag = "Audits",
    params(("id" = i32, Path, description = "Audit id")),
    responses(
        (status = 200, description = "Audit data"),
        (status = 404, description = "Audit not found", body = crate::error::ErrorResponse)
    )
)]
#[get("/audits/{id}")]
pub async fn get_audit(pool: web::Data<DbPool>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.get_audit_data(path.into_inner()).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/audits/{id}",
    tag = "Audits",
    params(
        ("id" = i32, Path, description = "Audit id"),
        ("page_url" = Option<String>, Query, description = "Workflow page the save came from")
    ),
    request_body = VersionedUpdate,
    responses(
        (status = 200, description = "Save outcome"),
        (status = 409, description = "Stale version", body = crate::error::ErrorResponse)
    )
)]
#[patch("/audits/{id}")]
pub async fn update_audit(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    page: web::Query<PageQuery>,
    body: web::Json<VersionedUpdate>,
) -> AppResult<HttpResponse> {
    let outcome = audit::update_audit(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(with_next_page(&pool, outcome, &page).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/audits/{id}/pages",
    tag = "Audits",
    params(("id" = i32, Path, description = "Audit id")),
    request_body = CreatePageRequest,
    responses((status = 201, description = "Page added"))
)]
#[post("/audits/{id}/pages")]
pub async fn add_page(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<CreatePageRequest>,
) -> AppResult<HttpResponse> {
    let page = audit::add_page(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Created().json(page))
}

#[utoipa::path(
    patch,
    path = "/api/v1/pages/{id}",
    tag = "Audits",
    params(
        ("id" = i32, Path, description = "Page id"),
        ("page_url" = Option<String>, Query, description = "Workflow page the save came from")
    ),
    request_body = VersionedUpdate,
    responses((status = 200, description = "Save outcome"))
)]
#[patch("/pages/{id}")]
pub async fn update_page(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    page: web::Query<PageQuery>,
    body: web::Json<VersionedUpdate>,
) -> AppResult<HttpResponse> {
    let outcome = audit::update_page(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(with_next_page(&pool, outcome, &page).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/pages/{id}",
    tag = "Audits",
    params(
        ("id" = i32, Path, description = "Page id"),
        ("version" = i32, Query, description = "Version the client read")
    ),
    responses((status = 200, description = "Page deleted"))
)]
#[delete("/pages/{id}")]
pub async fn delete_page(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    query: web::Query<VersionQuery>,
) -> AppResult<HttpResponse> {
    let outcome = audit::delete_page(&pool, user.id(), path.into_inner(), query.version).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Record the initial test of one page.
#[utoipa::path(
    put,
    path = "/api/v1/pages/{id}/check-results",
    tag = "Audits",
    params(("id" = i32, Path, description = "Page id")),
    request_body = PageCheckResultsRequest,
    responses(
        (status = 200, description = "Check results of the page"),
        (status = 409, description = "Stale version", body = crate::error::ErrorResponse)
    )
)]
#[put("/pages/{id}/check-results")]
pub async fn update_page_check_results(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<PageCheckResultsRequest>,
) -> AppResult<HttpResponse> {
    let results =
        audit::update_page_check_results(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(results))
}

/// Record the 12-week retest of one page.
#[utoipa::path(
    put,
    path = "/api/v1/pages/{id}/retest",
    tag = "Audits",
    params(("id" = i32, Path, description = "Page id")),
    request_body = PageRetestRequest,
    responses((status = 200, description = "Check results of the page"))
)]
#[put("/pages/{id}/retest")]
pub async fn update_page_retest(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<PageRetestRequest>,
) -> AppResult<HttpResponse> {
    let results = audit::update_page_retest(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(results))
}

/// Mark a page as missing at retest; its failures become not fixed.
#[utoipa::path(
    post,
    path = "/api/v1/pages/{id}/missing",
    tag = "Audits",
    params(("id" = i32, Path, description = "Page id")),
    request_body = PageMissingRequest,
    responses((status = 200, description = "Save outcome"))
)]
#[post("/pages/{id}/missing")]
pub async fn mark_page_missing(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<PageMissingRequest>,
) -> AppResult<HttpResponse> {
    let outcome = audit::mark_page_missing(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    put,
    path = "/api/v1/audits/{id}/statement-check-results",
    tag = "Audits",
    params(("id" = i32, Path, description = "Audit id")),
    request_body = Vec<StatementCheckResultInput>,
    responses((status = 200, description = "Updated audit data"))
)]
#[put("/audits/{id}/statement-check-results")]
pub async fn update_statement_check_results(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<Vec<StatementCheckResultInput>>,
) -> AppResult<HttpResponse> {
    let data =
        audit::update_statement_check_results(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(data))
}

#[utoipa::path(
    post,
    path = "/api/v1/audits/{id}/custom-statement-issues",
    tag = "Audits",
    params(("id" = i32, Path, description = "Audit id")),
    request_body = CreateCustomStatementIssueRequest,
    responses((status = 201, description = "Custom issue added"))
)]
#[post("/audits/{id}/custom-statement-issues")]
pub async fn add_custom_statement_issue(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<CreateCustomStatementIssueRequest>,
) -> AppResult<HttpResponse> {
    let issue =
        audit::add_custom_statement_issue(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Created().json(issue))
}

/// Whether test data changed since the report was last published.
#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/report-freshness",
    tag = "Audits",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "Report freshness", body = ReportFreshness))
)]
#[get("/cases/{id}/report-freshness")]
pub async fn report_freshness(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(audit::report_freshness(&pool, path.into_inner()).await?))
}
