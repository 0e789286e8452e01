//! Case comment endpoints.

use actix_web::{HttpResponse, delete, get, patch, post, web};

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::contact::{CreateCommentRequest, EditCommentRequest};
use crate::services::contacts;

pub fn configure_comment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_comments)
        .service(create_comment)
        .service(edit_comment)
        .service(delete_comment);
}

#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/comments",
    tag = "Comments",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "Comments, oldest first"))
)]
#[get("/cases/{id}/comments")]
pub async fn list_comments(pool: web::Data<DbPool>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_comments(path.into_inner()).await?))
}

/// Comment on a case.
///
/// The case's auditor, reviewer and the active QA auditor are notified,
/// except the author.
#[utoipa::path(
    post,
    path = "/api/v1/cases/{id}/comments",
    tag = "Comments",
    params(("id" = i32, Path, description = "Case id")),
    request_body = CreateCommentRequest,
    responses((status = 201, description = "Comment created"))
)]
#[post("/cases/{id}/comments")]
pub async fn create_comment(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let comment = contacts::create_comment(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Created().json(comment))
}

#[utoipa::path(
    patch,
    path = "/api/v1/comments/{id}",
    tag = "Comments",
    params(("id" = i32, Path, description = "Comment id")),
    request_body = EditCommentRequest,
    responses(
        (status = 200, description = "Save outcome"),
        (status = 403, description = "Not the author", body = crate::error::ErrorResponse)
    )
)]
#[patch("/comments/{id}")]
pub async fn edit_comment(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<EditCommentRequest>,
) -> AppResult<HttpResponse> {
    let outcome = contacts::edit_comment(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    tag = "Comments",
    params(("id" = i32, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Not the author", body = crate::error::ErrorResponse)
    )
)]
#[delete("/comments/{id}")]
pub async fn delete_comment(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    contacts::delete_comment(&pool, user.id(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
