//! Equality-body retest endpoints.

use actix_web::{HttpResponse, get, patch, post, put, web};

use super::{PageQuery, with_next_page};
use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::VersionedUpdate;
use crate::models::retest::{RetestDecision, RetestPageUpdate, StartRetestRequest};
use crate::services::retests;

pub fn configure_retest_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_retests)
        .service(start_retest)
        .service(decide_retest)
        .service(get_retest)
        .service(update_retest)
        .service(update_retest_page);
}

/// Retests of a case, excluding the original-test row.
#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/retests",
    tag = "Retests",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "Retests in order"))
)]
#[get("/cases/{id}/retests")]
pub async fn list_retests(pool: web::Data<DbPool>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(retests::list_real_retests(&pool, path.into_inner()).await?))
}

/// Start the next retest, carrying over the issues still unfixed.
#[utoipa::path(
    post,
    path = "/api/v1/cases/{id}/retests",
    tag = "Retests",
    params(("id" = i32, Path, description = "Case id")),
    request_body = StartRetestRequest,
    responses(
        (status = 201, description = "Retest with pages and results"),
        (status = 422, description = "Case has no audit", body = crate::error::ErrorResponse)
    )
)]
#[post("/cases/{id}/retests")]
pub async fn start_retest(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<StartRetestRequest>,
) -> AppResult<HttpResponse> {
    let detail = retests::start_retest(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Created().json(detail))
}

#[utoipa::path(
    get,
    path = "/api/v1/retests/{id}",
    tag = "Retests",
    params(("id" = i32, Path, description = "Retest id")),
    responses((status = 200, description = "Retest with pages and results"))
)]
#[get("/retests/{id}")]
pub async fn get_retest(pool: web::Data<DbPool>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.get_retest_detail(path.into_inner()).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/retests/{id}",
    tag = "Retests",
    params(
        ("id" = i32, Path, description = "Retest id"),
        ("page_url" = Option<String>, Query, description = "Workflow page the save came from")
    ),
    request_body = VersionedUpdate,
    responses((status = 200, description = "Save outcome"))
)]
#[patch("/retests/{id}")]
pub async fn update_retest(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    page: web::Query<PageQuery>,
    body: web::Json<VersionedUpdate>,
) -> AppResult<HttpResponse> {
    let outcome = retests::update_retest(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(with_next_page(&pool, outcome, &page).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/retests/{id}/decision",
    tag = "Retests",
    params(("id" = i32, Path, description = "Retest id")),
    request_body = RetestDecision,
    responses((status = 200, description = "Save outcome"))
)]
#[post("/retests/{id}/decision")]
pub async fn decide_retest(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<RetestDecision>,
) -> AppResult<HttpResponse> {
    let outcome = retests::decide_retest(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Record the retest of one page.
#[utoipa::path(
    put,
    path = "/api/v1/retest-pages/{id}",
    tag = "Retests",
    params(("id" = i32, Path, description = "Retest page id")),
    request_body = RetestPageUpdate,
    responses((status = 200, description = "Retest results of the page"))
)]
#[put("/retest-pages/{id}")]
pub async fn update_retest_page(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<RetestPageUpdate>,
) -> AppResult<HttpResponse> {
    let results = retests::update_retest_page(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(results))
}
