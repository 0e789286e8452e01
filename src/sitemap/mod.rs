//! Workflow sitemap.
//!
//! A case is worked through an ordered set of page groups. The tree is plain
//! data (`pages`), resolved against URLs (`routes`), bound to the entities
//! around the page being viewed (`context`) and hydrated into visible pages,
//! progress counts and the next page (`engine`).

pub mod context;
pub mod engine;
pub mod pages;
pub mod routes;
pub mod tree;

use std::sync::LazyLock;

use tracing::debug;

use crate::db::DbPool;
use crate::error::{AppError, AppResult};

pub use context::{BoundInstance, SitemapContext, load_context};
pub use engine::{HydratedGroup, HydratedPage, HydratedSitemap, hydrate};
pub use pages::platform_sitemap;
pub use tree::{GroupType, InstanceClass, PageKind, PlatformPage, PlatformPageGroup, Sitemap};

static SITEMAP: LazyLock<Sitemap> = LazyLock::new(platform_sitemap);

/// The platform sitemap.
pub fn sitemap() -> &'static Sitemap {
    &SITEMAP
}

/// Hydrate the sitemap for `url`, loading the entities it refers to.
pub async fn sitemap_for_url(pool: &DbPool, url: &str) -> AppResult<HydratedSitemap> {
    let (route_name, kwargs) = routes::resolve(url)
        .ok_or_else(|| AppError::NotFound(format!("Page for URL {}", url)))?;
    let (_, page) = sitemap()
        .find(route_name)
        .ok_or_else(|| AppError::NotFound(format!("Page {}", route_name)))?;

    let context = match (page.instance_class, kwargs.get(page.url_kwarg_key)) {
        (Some(class), Some(id)) => load_context(pool, class, *id).await?,
        _ => SitemapContext::default(),
    };
    debug!(route = route_name, case_scoped = context.is_case_scoped(), "Hydrating sitemap");

    hydrate(sitemap(), url, &context)
}

/// Next page after `url` in its workflow, if any.
pub async fn next_page_url(pool: &DbPool, url: &str) -> AppResult<Option<String>> {
    Ok(sitemap_for_url(pool, url).await?.next_page_url)
}
