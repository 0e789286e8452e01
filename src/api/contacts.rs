//! Contact, Zendesk ticket and equality-body correspondence endpoints.

use actix_web::{HttpResponse, delete, get, patch, post, web};

use super::{PageQuery, VersionBody, VersionQuery, with_next_page};
use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::VersionedUpdate;
use crate::models::contact::{
    CreateContactRequest, CreateCorrespondenceRequest, CreateZendeskTicketRequest,
};
use crate::services::contacts;

pub fn configure_contact_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_contacts)
        .service(create_contact)
        .service(update_contact)
        .service(delete_contact)
        .service(list_zendesk_tickets)
        .service(create_zendesk_ticket)
        .service(update_zendesk_ticket)
        .service(list_correspondence)
        .service(create_correspondence)
        .service(toggle_correspondence_status)
        .service(update_correspondence);
}

#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/contacts",
    tag = "Contacts",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "Contacts of the case"))
)]
#[get("/cases/{id}/contacts")]
pub async fn list_contacts(pool: web::Data<DbPool>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_contacts(path.into_inner()).await?))
}

/// Add a contact. A preferred contact demotes the case's other contacts.
#[utoipa::path(
    post,
    path = "/api/v1/cases/{id}/contacts",
    tag = "Contacts",
    params(("id" = i32, Path, description = "Case id")),
    request_body = CreateContactRequest,
    responses((status = 201, description = "Contact created"))
)]
#[post("/cases/{id}/contacts")]
pub async fn create_contact(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<CreateContactRequest>,
) -> AppResult<HttpResponse> {
    let contact =
        contacts::create_contact(&pool, user.id(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(contact))
}

#[utoipa::path(
    patch,
    path = "/api/v1/contacts/{id}",
    tag = "Contacts",
    params(
        ("id" = i32, Path, description = "Contact id"),
        ("page_url" = Option<String>, Query, description = "Workflow page the save came from")
    ),
    request_body = VersionedUpdate,
    responses((status = 200, description = "Save outcome"))
)]
#[patch("/contacts/{id}")]
pub async fn update_contact(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    page: web::Query<PageQuery>,
    body: web::Json<VersionedUpdate>,
) -> AppResult<HttpResponse> {
    let outcome = contacts::update_contact(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(with_next_page(&pool, outcome, &page).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/contacts/{id}",
    tag = "Contacts",
    params(
        ("id" = i32, Path, description = "Contact id"),
        ("version" = i32, Query, description = "Version the client read")
    ),
    responses((status = 204, description = "Contact deleted"))
)]
#[delete("/contacts/{id}")]
pub async fn delete_contact(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    query: web::Query<VersionQuery>,
) -> AppResult<HttpResponse> {
    contacts::delete_contact(&pool, user.id(), path.into_inner(), query.version).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/zendesk-tickets",
    tag = "Contacts",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "Zendesk tickets of the case"))
)]
#[get("/cases/{id}/zendesk-tickets")]
pub async fn list_zendesk_tickets(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_zendesk_tickets(path.into_inner()).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/cases/{id}/zendesk-tickets",
    tag = "Contacts",
    params(("id" = i32, Path, description = "Case id")),
    request_body = CreateZendeskTicketRequest,
    responses((status = 201, description = "Ticket recorded"))
)]
#[post("/cases/{id}/zendesk-tickets")]
pub async fn create_zendesk_ticket(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<CreateZendeskTicketRequest>,
) -> AppResult<HttpResponse> {
    let ticket =
        contacts::create_zendesk_ticket(&pool, user.id(), path.into_inner(), body.into_inner())
            .await?;
    Ok(HttpResponse::Created().json(ticket))
}

#[utoipa::path(
    patch,
    path = "/api/v1/zendesk-tickets/{id}",
    tag = "Contacts",
    params(("id" = i32, Path, description = "Ticket id")),
    request_body = VersionedUpdate,
    responses((status = 200, description = "Save outcome"))
)]
#[patch("/zendesk-tickets/{id}")]
pub async fn update_zendesk_ticket(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<VersionedUpdate>,
) -> AppResult<HttpResponse> {
    let outcome =
        contacts::update_zendesk_ticket(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/v1/cases/{id}/correspondence",
    tag = "Contacts",
    params(("id" = i32, Path, description = "Case id")),
    responses((status = 200, description = "Equality-body correspondence of the case"))
)]
#[get("/cases/{id}/correspondence")]
pub async fn list_correspondence(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(pool.list_correspondence(path.into_inner()).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/cases/{id}/correspondence",
    tag = "Contacts",
    params(("id" = i32, Path, description = "Case id")),
    request_body = CreateCorrespondenceRequest,
    responses((status = 201, description = "Correspondence recorded"))
)]
#[post("/cases/{id}/correspondence")]
pub async fn create_correspondence(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<CreateCorrespondenceRequest>,
) -> AppResult<HttpResponse> {
    let correspondence =
        contacts::create_correspondence(&pool, user.id(), path.into_inner(), body.into_inner())
            .await?;
    Ok(HttpResponse::Created().json(correspondence))
}

#[utoipa::path(
    patch,
    path = "/api/v1/correspondence/{id}",
    tag = "Contacts",
    params(("id" = i32, Path, description = "Correspondence id")),
    request_body = VersionedUpdate,
    responses((status = 200, description = "Save outcome"))
)]
#[patch("/correspondence/{id}")]
pub async fn update_correspondence(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<VersionedUpdate>,
) -> AppResult<HttpResponse> {
    let outcome =
        contacts::update_correspondence(&pool, user.id(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Flip correspondence between unresolved and resolved.
#[utoipa::path(
    post,
    path = "/api/v1/correspondence/{id}/toggle-status",
    tag = "Contacts",
    params(("id" = i32, Path, description = "Correspondence id")),
    request_body = VersionBody,
    responses((status = 200, description = "Updated correspondence"))
)]
#[post("/correspondence/{id}/toggle-status")]
pub async fn toggle_correspondence_status(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i32>,
    body: web::Json<VersionBody>,
) -> AppResult<HttpResponse> {
    let correspondence =
        contacts::toggle_correspondence_status(&pool, user.id(), path.into_inner(), body.version)
            .await?;
    Ok(HttpResponse::Ok().json(correspondence))
}
