//! API endpoint modules.
//!
//! Every write endpoint takes the acting user from `CurrentUser`. Versioned
//! updates accept an optional `page_url` query parameter naming the workflow
//! page the save came from; the response then carries the next page's URL.

pub mod audits;
pub mod cases;
pub mod catalogues;
pub mod comments;
pub mod contacts;
pub mod exports;
pub mod health;
pub mod openapi;
pub mod reports;
pub mod retests;
pub mod sitemap;
pub mod tasks;

use serde::Deserialize;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::SaveOutcome;

pub use audits::configure_audit_routes;
pub use cases::configure_case_routes;
pub use catalogues::configure_catalogue_routes;
pub use comments::configure_comment_routes;
pub use contacts::configure_contact_routes;
pub use exports::configure_export_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use reports::configure_report_routes;
pub use retests::configure_retest_routes;
pub use sitemap::configure_sitemap_routes;
pub use tasks::configure_task_routes;

/// Body carrying only the version the client read.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VersionBody {
    pub version: i32,
}

/// Query carrying the version the client read, for deletes.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionQuery {
    pub version: i32,
}

/// Workflow page a save was made from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page_url: Option<String>,
}

/// Attach the next workflow page to a save outcome.
pub async fn with_next_page<T>(
    pool: &DbPool,
    mut outcome: SaveOutcome<T>,
    page: &PageQuery,
) -> AppResult<SaveOutcome<T>> {
    if let Some(url) = &page.page_url {
        outcome.next_page_url = crate::sitemap::next_page_url(pool, url).await?;
    }
    Ok(outcome)
}
