//! Database operations for cases.

use sea_orm::*;

use crate::entity::audit::{self, Entity as Audit};
use crate::entity::case::{self, Entity as Case};
use crate::error::{AppError, AppResult};
use crate::models::{CaseListQuery, CaseStatus, CaseSummary, CaseVariant, Pagination, PaginationParams};

use super::DbPool;

/// Load a case by id, deleted or not.
pub async fn find_case<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<case::Model> {
    Case::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load case {}: {}", id, e)))?
        .ok_or_else(|| AppError::NotFound(format!("Case {}", id)))
}

/// The audit of a case, if testing has started.
pub async fn find_audit_for_case<C: ConnectionTrait>(
    conn: &C,
    case_id: i32,
) -> AppResult<Option<audit::Model>> {
    Audit::find()
        .filter(audit::Column::CaseId.eq(case_id))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load audit of case {}: {}", case_id, e)))
}

/// Next free case number for `variant`.
pub async fn next_case_number<C: ConnectionTrait>(conn: &C, variant: CaseVariant) -> AppResult<i32> {
    let latest = Case::find()
        .filter(case::Column::Variant.eq(variant))
        .order_by_desc(case::Column::CaseNumber)
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to read case numbers: {}", e)))?;
    Ok(latest.map(|c| c.case_number + 1).unwrap_or(1))
}

fn to_summary(case: case::Model) -> CaseSummary {
    CaseSummary {
        id: case.id,
        case_identifier: case.case_identifier,
        variant: case.variant,
        organisation_name: case.organisation_name,
        domain: case.domain,
        status: case.status,
        auditor_id: case.auditor_id,
        reviewer_id: case.reviewer_id,
        report_sent_date: case.report_sent_date,
    }
}

impl DbPool {
    pub async fn get_case(&self, id: i32) -> AppResult<case::Model> {
        find_case(self.connection(), id).await
    }

    pub async fn get_audit_for_case(&self, case_id: i32) -> AppResult<Option<audit::Model>> {
        find_audit_for_case(self.connection(), case_id).await
    }

    /// List cases, newest first. Deleted cases only appear when asked for by status.
    pub async fn list_cases(
        &self,
        query: &CaseListQuery,
    ) -> AppResult<(Vec<CaseSummary>, Pagination)> {
        let params = PaginationParams {
            page: query.page,
            limit: query.limit,
        };
        let limit = params.clamped_limit();

        let mut select = Case::find();
        match query.status {
            Some(status) => select = select.filter(case::Column::Status.eq(status)),
            None => select = select.filter(case::Column::IsDeleted.eq(false)),
        }
        if let Some(variant) = query.variant {
            select = select.filter(case::Column::Variant.eq(variant));
        }
        if let Some(auditor_id) = query.auditor_id {
            select = select.filter(case::Column::AuditorId.eq(auditor_id));
        }
        if let Some(reviewer_id) = query.reviewer_id {
            select = select.filter(case::Column::ReviewerId.eq(reviewer_id));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(case::Column::OrganisationName.contains(search))
                    .add(case::Column::Domain.contains(search.to_lowercase()))
                    .add(case::Column::CaseIdentifier.contains(search)),
            );
        }

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count cases: {}", e)))?;

        let cases = select
            .order_by_desc(case::Column::Id)
            .offset(params.offset() as u64)
            .limit(limit as u64)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list cases: {}", e)))?;

        Ok((
            cases.into_iter().map(to_summary).collect(),
            Pagination::new(params.page(), limit, total),
        ))
    }

    /// Cases whose cached status is one of `statuses`.
    pub async fn list_cases_by_status(&self, statuses: &[CaseStatus]) -> AppResult<Vec<case::Model>> {
        let cases = Case::find()
            .filter(case::Column::Status.is_in(statuses.iter().copied()))
            .filter(case::Column::IsDeleted.eq(false))
            .order_by_asc(case::Column::Id)
            .all(self.connection())
            .await?;
        Ok(cases)
    }

    /// Non-deleted cases, for jobs that recompute cached state.
    pub async fn list_active_cases(&self) -> AppResult<Vec<case::Model>> {
        let cases = Case::find()
            .filter(case::Column::IsDeleted.eq(false))
            .order_by_asc(case::Column::Id)
            .all(self.connection())
            .await?;
        Ok(cases)
    }
}
