//! Equality-body CSV exports and email rendering.

use actix_web::{HttpResponse, get, http::header, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::services::{email_templates, equality_body_export};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ExportQuery {
    /// Comma-separated case ids.
    pub case_ids: String,
}

pub fn configure_export_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(export_closed_cases)
        .service(export_cases)
        .service(required_data_missing)
        .service(render_email);
}

fn parse_case_ids(raw: &str) -> AppResult<Vec<i32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>()
                .map_err(|_| AppError::InvalidInput(format!("Invalid case id '{}'", s)))
        })
        .collect()
}

fn csv_response(filename: &str, body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(body)
}

/// Export chosen cases in the equality-body CSV layout.
#[utoipa::path(
    get,
    path = "/api/v1/exports/equality-body",
    tag = "Exports",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv"),
        (status = 400, description = "Malformed case id list", body = crate::error::ErrorResponse)
    )
)]
#[get("/exports/equality-body")]
pub async fn export_cases(
    pool: web::Data<DbPool>,
    query: web::Query<ExportQuery>,
) -> AppResult<HttpResponse> {
    let ids = parse_case_ids(&query.case_ids)?;
    let body = equality_body_export::export_cases(&pool, &ids).await?;
    Ok(csv_response("equality_body_cases.csv", body))
}

#[utoipa::path(
    get,
    path = "/api/v1/exports/equality-body/closed",
    tag = "Exports",
    responses((status = 200, description = "CSV export", content_type = "text/csv"))
)]
#[get("/exports/equality-body/closed")]
pub async fn export_closed_cases(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let body = equality_body_export::export_closed_cases(&pool).await?;
    Ok(csv_response("equality_body_closed_cases.csv", body))
}

#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/equality-body-export/missing",
    tag = "Exports",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "Required columns without data", body = equality_body_export::RequiredDataMissing))
)]
#[get("/cases/{id}/equality-body-export/missing")]
pub async fn required_data_missing(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let missing = equality_body_export::required_data_missing(&pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(missing))
}

/// Render an email template against a case.
#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/emails/{template_id}",
    tag = "Exports",
    params(
        ("id" = i32, Path, description = "Case id"),
        ("template_id" = i32, Path, description = "Email template id")
    ),
    responses((status = 200, description = "Rendered email"))
)]
#[get("/cases/{id}/emails/{template_id}")]
pub async fn render_email(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
) -> AppResult<HttpResponse> {
    let (case_id, template_id) = path.into_inner();
    let rendered = email_templates::render_for_case(&pool, template_id, case_id).await?;
    Ok(HttpResponse::Ok().json(rendered))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_ids() {
        assert_eq!(parse_case_ids("3, 1,,2").unwrap(), vec![3, 1, 2]);
        assert!(parse_case_ids("").unwrap().is_empty());
        assert!(matches!(parse_case_ids("1,x"), Err(AppError::InvalidInput(_))));
    }
}
