//! Validation of previous-case URLs against this platform.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Url;
use tracing::warn;

use crate::db::DbPool;
use crate::error::{AppError, AppResult};

static CASE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/cases/(\d+)/").expect("case path pattern is valid"));

const FIELD: &str = "previous_case_url";

/// Case id of a URL on this platform, e.g. `https://host/cases/42/view/`.
pub fn previous_case_id(url: &str, platform_domain: &str) -> Option<i32> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = match parsed.port() {
        Some(port) => format!("{}:{}", parsed.host_str()?, port),
        None => parsed.host_str()?.to_string(),
    };
    if !host.eq_ignore_ascii_case(platform_domain) {
        return None;
    }
    let path = if parsed.path().ends_with('/') {
        parsed.path().to_string()
    } else {
        format!("{}/", parsed.path())
    };
    CASE_PATH
        .captures(&path)
        .and_then(|captures| captures.get(1))
        .and_then(|id| id.as_str().parse().ok())
}

/// Outbound HEAD checks with a fixed timeout.
#[derive(Clone)]
pub struct UrlChecker {
    client: reqwest::Client,
}

impl UrlChecker {
    pub fn new(timeout_secs: u64) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::InvalidInput(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Whether a HEAD request to `url` succeeds.
    pub async fn head_ok(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => response.status().is_success() || response.status().is_redirection(),
            Err(e) => {
                warn!(url, error = %e, "HEAD request failed");
                false
            }
        }
    }
}

/// Validate a previous-case URL, returning the referenced case id.
///
/// Every failure is reported as a validation error on the field.
pub async fn validate_previous_case_url(
    pool: &DbPool,
    checker: &UrlChecker,
    platform_domain: &str,
    url: &str,
) -> AppResult<Option<i32>> {
    if url.trim().is_empty() {
        return Ok(None);
    }
    let case_id = previous_case_id(url, platform_domain)
        .ok_or_else(|| AppError::field(FIELD, "Enter the URL of a case on this platform"))?;
    match pool.get_case(case_id).await {
        Ok(_) => {}
        Err(AppError::NotFound(_)) => {
            return Err(AppError::field(FIELD, format!("Case {} does not exist", case_id)));
        }
        Err(e) => return Err(e),
    }
    if !checker.head_ok(url.trim()).await {
        return Err(AppError::field(FIELD, "The previous case URL could not be reached"));
    }
    Ok(Some(case_id))
}

/// Previous-case URL validation bound to this platform's domain.
#[derive(Clone)]
pub struct PreviousCaseCheck {
    pub checker: UrlChecker,
    pub platform_domain: String,
}

impl PreviousCaseCheck {
    pub async fn validate(&self, pool: &DbPool, url: &str) -> AppResult<Option<i32>> {
        validate_previous_case_url(pool, &self.checker, &self.platform_domain, url).await
    }
}
