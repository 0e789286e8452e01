//! Publication of approved reports as immutable, versioned blobs.

use chrono::Utc;
use sea_orm::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::cases::find_case;
use crate::db::history::{record_case_event, record_create};
use crate::db::reports::{
    SectionWithRows, find_report_for_case, list_s3_reports, list_sections,
    list_visible_table_rows, to_published_summary,
};
use crate::db::{self, DbPool};
use crate::entity::s3_report::{self, Entity as S3Report};
use crate::error::{AppError, AppResult};
use crate::models::report::PublishResponse;
use crate::models::{CaseEventType, EntityRef, ReportApprovedStatus};
use crate::services::identifiers::{clean_org, report_key};
use crate::services::report_generator::render_html;
use crate::services::storage::BlobStore;

/// Blob key of a stored published report, recomputed from its columns.
///
/// Fails when the stored key no longer matches, since the object would be
/// unreachable.
pub fn published_key(report: &s3_report::Model) -> AppResult<String> {
    let key = report_key(
        report.case_id,
        &report.clean_org,
        report.version,
        &report.report_version,
        &report.guid,
    );
    if key != report.key {
        return Err(AppError::Storage(format!(
            "Published report {} key mismatch: stored {}, derived {}",
            report.id, report.key, key
        )));
    }
    Ok(key)
}

/// Publish the current draft report of a case.
///
/// The new row and the previous latest flag are only committed once the
/// blob store has accepted the HTML.
pub async fn publish_report(
    pool: &DbPool,
    store: &dyn BlobStore,
    user_id: i32,
    case_id: i32,
) -> AppResult<s3_report::Model> {
    let platform = pool.get_platform().await?;
    let txn = pool.begin().await?;
    let case = find_case(&txn, case_id).await?;
    if case.report_approved_status != ReportApprovedStatus::Approved {
        return Err(AppError::NotQaApproved(case_id));
    }
    let report = find_report_for_case(&txn, case_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report for case {}", case_id)))?;

    let mut sections = Vec::new();
    for section in list_sections(&txn, report.id).await? {
        let rows = list_visible_table_rows(&txn, section.id).await?;
        sections.push(SectionWithRows { section, rows });
    }
    let html = render_html(&case, &report.report_version, &sections, &platform.footer_links)?;

    let existing = list_s3_reports(&txn, case_id).await?;
    let version = existing.iter().map(|r| r.version).max().unwrap_or(0) + 1;

    S3Report::update_many()
        .col_expr(s3_report::Column::LatestPublished, sea_query::Expr::value(false))
        .filter(s3_report::Column::CaseId.eq(case_id))
        .filter(s3_report::Column::LatestPublished.eq(true))
        .exec(&txn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to clear latest published report: {}", e)))?;

    let guid = Uuid::new_v4().to_string();
    let org = clean_org(&case.organisation_name);
    let key = report_key(case_id, &org, version, &report.report_version, &guid);

    let published = s3_report::ActiveModel {
        case_id: Set(case_id),
        version: Set(version),
        guid: Set(guid),
        report_version: Set(report.report_version.clone()),
        clean_org: Set(org),
        html: Set(html.clone()),
        latest_published: Set(true),
        key: Set(key.clone()),
        created: Set(Utc::now()),
        created_by_id: Set(Some(user_id)),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::Database(format!("Failed to create published report: {}", e)))?;

    if let Err(e) = store.put(&key, html.into_bytes()).await {
        warn!(case_id, key = %key, error = %e, "Blob store rejected published report");
        return Err(e);
    }

    record_create(&txn, EntityRef::S3Report(published.id), Some(case_id), Some(user_id), &published)
        .await?;
    record_case_event(
        &txn,
        case_id,
        CaseEventType::PublishReport,
        format!("Published report version {}", version),
        Some(user_id),
    )
    .await?;

    db::commit(txn).await?;
    info!(case_id, version, key = %key, "Report published");
    Ok(published)
}

/// Publish, turning a missing QA approval into a guard response.
pub async fn publish_or_guard(
    pool: &DbPool,
    store: &dyn BlobStore,
    user_id: i32,
    case_id: i32,
) -> AppResult<PublishResponse> {
    match publish_report(pool, store, user_id, case_id).await {
        Ok(published) => Ok(PublishResponse {
            published: true,
            guard: None,
            report: Some(to_published_summary(&published)),
        }),
        Err(AppError::NotQaApproved(_)) => Ok(PublishResponse {
            published: false,
            guard: Some(
                "The report has not been approved by QA. Approve the report before publishing."
                    .to_string(),
            ),
            report: None,
        }),
        Err(e) => Err(e),
    }
}

/// HTML of a published report, read back from the blob store.
pub async fn fetch_published_html(
    pool: &DbPool,
    store: &dyn BlobStore,
    guid: &str,
) -> AppResult<String> {
    let report = pool.get_published_report_by_guid(guid).await?;
    let key = published_key(&report)?;
    let body = store.get(&key).await?;
    String::from_utf8(body)
        .map_err(|e| AppError::Storage(format!("Published report {} is not UTF-8: {}", key, e)))
}

/// Write every published report missing from the blob store.
///
/// Returns the number of objects written.
pub async fn create_missing_documents(pool: &DbPool, store: &dyn BlobStore) -> AppResult<usize> {
    let mut written = 0;
    for report in pool.list_all_s3_reports().await? {
        let key = published_key(&report)?;
        if store.head(&key).await? {
            continue;
        }
        store.put(&key, report.html.clone().into_bytes()).await?;
        info!(case_id = report.case_id, key = %key, "Created missing published document");
        written += 1;
    }
    Ok(written)
}
