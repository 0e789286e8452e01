//! Database operations for equality-body retests.

use sea_orm::*;

use crate::entity::retest::{self, Entity as Retest};
use crate::entity::retest_check_result::{self, Entity as RetestCheckResult};
use crate::entity::retest_page::{self, Entity as RetestPage};
use crate::error::{AppError, AppResult};

use super::DbPool;

/// Retest rows of a case ordered by `id_within_case`, the original test first.
pub async fn list_retests<C: ConnectionTrait>(conn: &C, case_id: i32) -> AppResult<Vec<retest::Model>> {
    Retest::find()
        .filter(retest::Column::CaseId.eq(case_id))
        .filter(retest::Column::IsDeleted.eq(false))
        .order_by_asc(retest::Column::IdWithinCase)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list retests: {}", e)))
}

pub async fn find_retest<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<retest::Model> {
    Retest::find_by_id(id)
        .filter(retest::Column::IsDeleted.eq(false))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load retest {}: {}", id, e)))?
        .ok_or_else(|| AppError::NotFound(format!("Retest {}", id)))
}

pub async fn find_retest_page<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<retest_page::Model> {
    RetestPage::find_by_id(id)
        .filter(retest_page::Column::IsDeleted.eq(false))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load retest page {}: {}", id, e)))?
        .ok_or_else(|| AppError::NotFound(format!("Retest page {}", id)))
}

pub async fn list_retest_pages<C: ConnectionTrait>(
    conn: &C,
    retest_id: i32,
) -> AppResult<Vec<retest_page::Model>> {
    RetestPage::find()
        .filter(retest_page::Column::RetestId.eq(retest_id))
        .filter(retest_page::Column::IsDeleted.eq(false))
        .order_by_asc(retest_page::Column::Id)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list retest pages: {}", e)))
}

pub async fn list_retest_check_results<C: ConnectionTrait>(
    conn: &C,
    retest_id: i32,
) -> AppResult<Vec<retest_check_result::Model>> {
    RetestCheckResult::find()
        .filter(retest_check_result::Column::RetestId.eq(retest_id))
        .filter(retest_check_result::Column::IsDeleted.eq(false))
        .order_by_asc(retest_check_result::Column::RetestPageId)
        .order_by_asc(retest_check_result::Column::WcagDefinitionId)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list retest check results: {}", e)))
}

/// A retest with its pages and results.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RetestDetail {
    #[serde(flatten)]
    pub retest: retest::Model,
    pub pages: Vec<retest_page::Model>,
    pub check_results: Vec<retest_check_result::Model>,
}

impl DbPool {
    pub async fn list_retests(&self, case_id: i32) -> AppResult<Vec<retest::Model>> {
        list_retests(self.connection(), case_id).await
    }

    pub async fn get_retest_detail(&self, id: i32) -> AppResult<RetestDetail> {
        let retest = find_retest(self.connection(), id).await?;
        let pages = list_retest_pages(self.connection(), id).await?;
        let check_results = list_retest_check_results(self.connection(), id).await?;
        Ok(RetestDetail {
            retest,
            pages,
            check_results,
        })
    }
}
