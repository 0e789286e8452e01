//! Workflow navigation endpoint.

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::sitemap::{self, HydratedSitemap};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SitemapQuery {
    /// URL of the page being viewed.
    pub url: String,
}

pub fn configure_sitemap_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_sitemap);
}

/// Navigation for a page: visible groups and pages with completion state,
/// the current page and group, and the next page in the workflow.
#[utoipa::path(
    get,
    path = "/api/v1/sitemap",
    tag = "Sitemap",
    params(SitemapQuery),
    responses(
        (status = 200, description = "Hydrated sitemap", body = HydratedSitemap),
        (status = 404, description = "Unknown page URL", body = crate::error::ErrorResponse)
    )
)]
#[get("/sitemap")]
pub async fn get_sitemap(
    pool: web::Data<DbPool>,
    query: web::Query<SitemapQuery>,
) -> AppResult<HttpResponse> {
    let hydrated = sitemap::sitemap_for_url(&pool, &query.url).await?;
    Ok(HttpResponse::Ok().json(hydrated))
}
