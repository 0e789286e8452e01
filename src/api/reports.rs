//! Report generation and publication endpoints.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::db::reports::SectionWithRows;
use crate::entity::report;
use crate::error::AppResult;
use crate::models::report::{PublishResponse, PublishedReportSummary, SectionOverrideRequest};
use crate::services::storage::BlobStore;
use crate::services::{publisher, report_generator};

#[derive(Serialize)]
pub struct ReportDetailResponse {
    pub report: report::Model,
    pub sections: Vec<SectionWithRows>,
}

/// Note: more specific routes must be registered before generic ones.
pub fn configure_report_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(generate_report)
        .service(preview_report)
        .service(publish_report)
        .service(list_published_reports)
        .service(get_report)
        .service(set_section_override)
        .service(delete_table_row)
        .service(view_published_report);
}

/// Rebuild the report from the base templates and test results.
///
/// Content overrides are kept per section name.
#[utoipa::path(
    post,
    path = "/api/v1/cases/{id}/report/generate",
    tag = "Reports",
    params(("id" = i32, Path, description = "Case id")),
    responses(
        (status = 200, description = "Sections with their table rows"),
        (status = 422, description = "Case has no audit", body = crate::error::ErrorResponse)
    )
)]
#[post("/cases/{id}/report/generate")]
pub async fn generate_report(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let sections = report_generator::generate_report(&pool, user.id(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(sections))
}

#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/report",
    tag = "Reports",
    params(("id" = i32, Path, description = "Case id")),
    responses(
        (status = 200, description = "Report with sections"),
        (status = 404, description = "No report yet", body = crate::error::ErrorResponse)
    )
)]
#[get("/cases/{id}/report")]
pub async fn get_report(pool: web::Data<DbPool>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    let report = pool.get_report_for_case(path.into_inner()).await?;
    let sections = pool.get_sections_with_rows(report.id).await?;
    Ok(HttpResponse::Ok().json(ReportDetailResponse { report, sections }))
}

/// Render the unpublished report.
#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/report/preview",
    tag = "Reports",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "Report HTML", content_type = "text/html"))
)]
#[get("/cases/{id}/report/preview")]
pub async fn preview_report(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let html = report_generator::preview_html(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

/// Publish the report.
///
/// Without QA approval nothing is written and a guard message is returned.
#[utoipa::path(
    post,
    path = "/api/v1/cases/{id}/report/publish",
    tag = "Reports",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "Publication result", body = PublishResponse))
)]
#[post("/cases/{id}/report/publish")]
pub async fn publish_report(
    pool: web::Data<DbPool>,
    store: web::Data<dyn BlobStore>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let response =
        publisher::publish_or_guard(&pool, store.get_ref(), user.id(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/published-reports",
    tag = "Reports",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "Published versions, newest first", body = Vec<PublishedReportSummary>))
)]
#[get("/cases/{id}/published-reports")]
pub async fn list_published_reports(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_published_reports(path.into_inner()).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/sections/{id}/override",
    tag = "Reports",
    params(("id" = i32, Path, description = "Section id")),
    request_body = SectionOverrideRequest,
    responses((status = 200, description = "Updated section"))
)]
#[put("/sections/{id}/override")]
pub async fn set_section_override(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<SectionOverrideRequest>,
) -> AppResult<HttpResponse> {
    let section =
        report_generator::set_section_override(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(section))
}

/// Remove a table row; the remaining rows are renumbered.
#[utoipa::path(
    delete,
    path = "/api/v1/table-rows/{id}",
    tag = "Reports",
    params(("id" = i32, Path, description = "Table row id")),
    responses((status = 200, description = "Remaining rows of the section"))
)]
#[delete("/table-rows/{id}")]
pub async fn delete_table_row(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let rows = report_generator::delete_table_row(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Public view of a published report.
#[utoipa::path(
    get,
    path = "/api/v1/reports/{guid}",
    tag = "Reports",
    params(("guid" = String, Path, description = "Published report guid")),
    responses(
        (status = 200, description = "Report HTML", content_type = "text/html"),
        (status = 404, description = "Report not found", body = crate::error::ErrorResponse)
    )
)]
#[get("/reports/{guid}")]
pub async fn view_published_report(
    pool: web::Data<DbPool>,
    store: web::Data<dyn BlobStore>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let html = publisher::fetch_published_html(&pool, store.get_ref(), &path).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}
