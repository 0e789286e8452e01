//! Reference catalogue endpoints: WCAG definitions, statement checks,
//! email templates, sectors and report base templates.

use actix_web::{HttpResponse, get, post, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::catalogue::{
    CreateEmailTemplateRequest, CreateStatementCheckRequest, CreateWcagDefinitionRequest,
    EmailTemplateType, EndCatalogueEntryRequest,
};
use crate::services::email_templates;

/// Restrict a catalogue listing to entries valid on a date.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ValidOnQuery {
    pub on: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EmailTemplateQuery {
    #[serde(rename = "type")]
    pub template_type: Option<EmailTemplateType>,
    /// Include retired templates.
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSectorRequest {
    pub name: String,
}

pub fn configure_catalogue_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_wcag_definitions)
        .service(create_wcag_definition)
        .service(end_wcag_definition)
        .service(list_statement_checks)
        .service(create_statement_check)
        .service(end_statement_check)
        .service(list_email_templates)
        .service(create_email_template)
        .service(list_sectors)
        .service(create_sector)
        .service(list_sub_categories)
        .service(list_base_templates);
}

#[utoipa::path(
    get,
    path = "/api/v1/wcag-definitions",
    tag = "Catalogues",
    params(ValidOnQuery),
    responses((status = 200, description = "WCAG definitions"))
)]
#[get("/wcag-definitions")]
pub async fn list_wcag_definitions(
    pool: web::Data<DbPool>,
    query: web::Query<ValidOnQuery>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_wcag_definitions(query.on).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/wcag-definitions",
    tag = "Catalogues",
    request_body = CreateWcagDefinitionRequest,
    responses((status = 201, description = "WCAG definition created"))
)]
#[post("/wcag-definitions")]
pub async fn create_wcag_definition(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    body: web::Json<CreateWcagDefinitionRequest>,
) -> AppResult<HttpResponse> {
    if body.name.trim().is_empty() {
        return Err(AppError::field("name", "Enter a name"));
    }
    Ok(HttpResponse::Created().json(pool.create_wcag_definition(&body).await?))
}

/// Retire a WCAG definition. Tests started on or after `date_end` no longer
/// receive it; existing results keep their link.
#[utoipa::path(
    post,
    path = "/api/v1/wcag-definitions/{id}/end",
    tag = "Catalogues",
    params(("id" = i32, Path, description = "WCAG definition id")),
    request_body = EndCatalogueEntryRequest,
    responses((status = 200, description = "WCAG definition"))
)]
#[post("/wcag-definitions/{id}/end")]
pub async fn end_wcag_definition(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<EndCatalogueEntryRequest>,
) -> AppResult<HttpResponse> {
    let definition = pool
        .end_wcag_definition(path.into_inner(), body.date_end)
        .await?;
    Ok(HttpResponse::Ok().json(definition))
}

#[utoipa::path(
    get,
    path = "/api/v1/statement-checks",
    tag = "Catalogues",
    params(ValidOnQuery),
    responses((status = 200, description = "Statement checks by type and position"))
)]
#[get("/statement-checks")]
pub async fn list_statement_checks(
    pool: web::Data<DbPool>,
    query: web::Query<ValidOnQuery>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_statement_checks(query.on).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/statement-checks",
    tag = "Catalogues",
    request_body = CreateStatementCheckRequest,
    responses((status = 201, description = "Statement check created"))
)]
#[post("/statement-checks")]
pub async fn create_statement_check(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    body: web::Json<CreateStatementCheckRequest>,
) -> AppResult<HttpResponse> {
    if body.label.trim().is_empty() {
        return Err(AppError::field("label", "Enter a label"));
    }
    Ok(HttpResponse::Created().json(pool.create_statement_check(&body).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/statement-checks/{id}/end",
    tag = "Catalogues",
    params(("id" = i32, Path, description = "Statement check id")),
    request_body = EndCatalogueEntryRequest,
    responses((status = 200, description = "Statement check"))
)]
#[post("/statement-checks/{id}/end")]
pub async fn end_statement_check(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<EndCatalogueEntryRequest>,
) -> AppResult<HttpResponse> {
    let check = pool
        .end_statement_check(path.into_inner(), body.date_end)
        .await?;
    Ok(HttpResponse::Ok().json(check))
}

#[utoipa::path(
    get,
    path = "/api/v1/email-templates",
    tag = "Catalogues",
    params(EmailTemplateQuery),
    responses((status = 200, description = "Email templates"))
)]
#[get("/email-templates")]
pub async fn list_email_templates(
    pool: web::Data<DbPool>,
    query: web::Query<EmailTemplateQuery>,
) -> AppResult<HttpResponse> {
    let templates = if query.all {
        pool.list_email_templates(None, query.template_type).await?
    } else {
        email_templates::list_current_templates(&pool, query.template_type).await?
    };
    Ok(HttpResponse::Ok().json(templates))
}

#[utoipa::path(
    post,
    path = "/api/v1/email-templates",
    tag = "Catalogues",
    request_body = CreateEmailTemplateRequest,
    responses(
        (status = 201, description = "Email template created"),
        (status = 400, description = "Template does not parse", body = crate::error::ErrorResponse)
    )
)]
#[post("/email-templates")]
pub async fn create_email_template(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    body: web::Json<CreateEmailTemplateRequest>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Created().json(pool.create_email_template(&body).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/sectors",
    tag = "Catalogues",
    responses((status = 200, description = "Sectors by name"))
)]
#[get("/sectors")]
pub async fn list_sectors(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_sectors().await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/sectors",
    tag = "Catalogues",
    request_body = CreateSectorRequest,
    responses((status = 201, description = "Sector created"))
)]
#[post("/sectors")]
pub async fn create_sector(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    body: web::Json<CreateSectorRequest>,
) -> AppResult<HttpResponse> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::field("name", "Enter a name"));
    }
    Ok(HttpResponse::Created().json(pool.create_sector(name).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/sub-categories",
    tag = "Catalogues",
    responses((status = 200, description = "Sub-categories by name"))
)]
#[get("/sub-categories")]
pub async fn list_sub_categories(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_sub_categories().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/base-templates",
    tag = "Catalogues",
    responses((status = 200, description = "Report base templates by position"))
)]
#[get("/base-templates")]
pub async fn list_base_templates(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_base_templates().await?))
}
