//! Database operations for audits, pages and check results.

use sea_orm::*;

use crate::entity::audit::{self, Entity as Audit};
use crate::entity::check_result::{self, Entity as CheckResult};
use crate::entity::page::{self, Entity as Page};
use crate::entity::statement_check_result::{self, Entity as StatementCheckResult};
use crate::entity::wcag_definition::Entity as WcagDefinition;
use crate::error::{AppError, AppResult};
use crate::models::AuditData;

use super::DbPool;

pub async fn find_audit<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<audit::Model> {
    Audit::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load audit {}: {}", id, e)))?
        .ok_or_else(|| AppError::NotFound(format!("Audit {}", id)))
}

/// Load a live page. Deleted pages are not found.
pub async fn find_page<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<page::Model> {
    Page::find_by_id(id)
        .filter(page::Column::IsDeleted.eq(false))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load page {}: {}", id, e)))?
        .ok_or_else(|| AppError::NotFound(format!("Page {}", id)))
}

pub async fn find_check_result<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> AppResult<check_result::Model> {
    CheckResult::find_by_id(id)
        .filter(check_result::Column::IsDeleted.eq(false))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load check result {}: {}", id, e)))?
        .ok_or_else(|| AppError::NotFound(format!("Check result {}", id)))
}

pub async fn find_statement_check_result<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> AppResult<statement_check_result::Model> {
    StatementCheckResult::find_by_id(id)
        .filter(statement_check_result::Column::IsDeleted.eq(false))
        .one(conn)
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to load statement check result {}: {}", id, e))
        })?
        .ok_or_else(|| AppError::NotFound(format!("Statement check result {}", id)))
}

/// Check results of one page, including those on expired WCAG definitions.
pub async fn list_check_results_for_page<C: ConnectionTrait>(
    conn: &C,
    page_id: i32,
) -> AppResult<Vec<check_result::Model>> {
    CheckResult::find()
        .filter(check_result::Column::PageId.eq(page_id))
        .filter(check_result::Column::IsDeleted.eq(false))
        .order_by_asc(check_result::Column::WcagDefinitionId)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list check results: {}", e)))
}

/// Load the full read view of an audit.
pub async fn load_audit_data<C: ConnectionTrait>(conn: &C, audit_id: i32) -> AppResult<AuditData> {
    let audit = find_audit(conn, audit_id).await?;

    let pages = Page::find()
        .filter(page::Column::AuditId.eq(audit_id))
        .filter(page::Column::IsDeleted.eq(false))
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list pages: {}", e)))?;

    let check_results = CheckResult::find()
        .filter(check_result::Column::AuditId.eq(audit_id))
        .filter(check_result::Column::IsDeleted.eq(false))
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list check results: {}", e)))?;

    let mut wcag_ids: Vec<i32> = check_results.iter().map(|r| r.wcag_definition_id).collect();
    wcag_ids.sort_unstable();
    wcag_ids.dedup();
    let wcag_definitions = WcagDefinition::find()
        .filter(crate::entity::wcag_definition::Column::Id.is_in(wcag_ids))
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load WCAG definitions: {}", e)))?;

    let statement_check_results = StatementCheckResult::find()
        .filter(statement_check_result::Column::AuditId.eq(audit_id))
        .filter(statement_check_result::Column::IsDeleted.eq(false))
        .order_by_asc(statement_check_result::Column::CheckType)
        .order_by_asc(statement_check_result::Column::IssueNumber)
        .all(conn)
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to list statement check results: {}", e))
        })?;

    Ok(AuditData::new(
        audit,
        pages,
        check_results,
        wcag_definitions,
        statement_check_results,
    ))
}

impl DbPool {
    pub async fn get_audit(&self, id: i32) -> AppResult<audit::Model> {
        find_audit(self.connection(), id).await
    }

    pub async fn get_audit_data(&self, audit_id: i32) -> AppResult<AuditData> {
        load_audit_data(self.connection(), audit_id).await
    }

    pub async fn get_page(&self, id: i32) -> AppResult<page::Model> {
        find_page(self.connection(), id).await
    }

    pub async fn list_check_results_for_page(
        &self,
        page_id: i32,
    ) -> AppResult<Vec<check_result::Model>> {
        list_check_results_for_page(self.connection(), page_id).await
    }
}
