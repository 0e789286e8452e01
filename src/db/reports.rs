//! Database operations for reports, sections and published reports.

use sea_orm::*;

use crate::entity::report::{self, Entity as Report};
use crate::entity::s3_report::{self, Entity as S3Report};
use crate::entity::section::{self, Entity as Section};
use crate::entity::table_row::{self, Entity as TableRow};
use crate::error::{AppError, AppResult};
use crate::models::PublishedReportSummary;

use super::DbPool;

pub async fn find_report_for_case<C: ConnectionTrait>(
    conn: &C,
    case_id: i32,
) -> AppResult<Option<report::Model>> {
    Report::find()
        .filter(report::Column::CaseId.eq(case_id))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load report of case {}: {}", case_id, e)))
}

pub async fn list_sections<C: ConnectionTrait>(
    conn: &C,
    report_id: i32,
) -> AppResult<Vec<section::Model>> {
    Section::find()
        .filter(section::Column::ReportId.eq(report_id))
        .order_by_asc(section::Column::Position)
        .order_by_asc(section::Column::Id)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list sections: {}", e)))
}

/// Table rows of a section that are not soft-deleted, in row order.
pub async fn list_visible_table_rows<C: ConnectionTrait>(
    conn: &C,
    section_id: i32,
) -> AppResult<Vec<table_row::Model>> {
    TableRow::find()
        .filter(table_row::Column::SectionId.eq(section_id))
        .filter(table_row::Column::IsDeleted.eq(false))
        .order_by_asc(table_row::Column::RowNumber)
        .order_by_asc(table_row::Column::Id)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list table rows: {}", e)))
}

/// Published reports of a case, newest first.
pub async fn list_s3_reports<C: ConnectionTrait>(
    conn: &C,
    case_id: i32,
) -> AppResult<Vec<s3_report::Model>> {
    S3Report::find()
        .filter(s3_report::Column::CaseId.eq(case_id))
        .order_by_desc(s3_report::Column::Version)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list published reports: {}", e)))
}

pub async fn find_latest_published<C: ConnectionTrait>(
    conn: &C,
    case_id: i32,
) -> AppResult<Option<s3_report::Model>> {
    S3Report::find()
        .filter(s3_report::Column::CaseId.eq(case_id))
        .filter(s3_report::Column::LatestPublished.eq(true))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load latest published report: {}", e)))
}

pub fn to_published_summary(model: &s3_report::Model) -> PublishedReportSummary {
    PublishedReportSummary {
        id: model.id,
        case_id: model.case_id,
        version: model.version,
        guid: model.guid.clone(),
        report_version: model.report_version.clone(),
        latest_published: model.latest_published,
        key: model.key.clone(),
        created: model.created,
        created_by_id: model.created_by_id,
    }
}

/// A section together with its visible rows.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SectionWithRows {
    #[serde(flatten)]
    pub section: section::Model,
    pub rows: Vec<table_row::Model>,
}

impl DbPool {
    pub async fn get_report_for_case(&self, case_id: i32) -> AppResult<report::Model> {
        find_report_for_case(self.connection(), case_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report for case {}", case_id)))
    }

    pub async fn get_sections_with_rows(&self, report_id: i32) -> AppResult<Vec<SectionWithRows>> {
        let sections = list_sections(self.connection(), report_id).await?;
        let mut result = Vec::with_capacity(sections.len());
        for section in sections {
            let rows = list_visible_table_rows(self.connection(), section.id).await?;
            result.push(SectionWithRows { section, rows });
        }
        Ok(result)
    }

    pub async fn get_section(&self, id: i32) -> AppResult<section::Model> {
        Section::find_by_id(id)
            .one(self.connection())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Section {}", id)))
    }

    pub async fn get_table_row(&self, id: i32) -> AppResult<table_row::Model> {
        TableRow::find_by_id(id)
            .filter(table_row::Column::IsDeleted.eq(false))
            .one(self.connection())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Table row {}", id)))
    }

    pub async fn list_published_reports(
        &self,
        case_id: i32,
    ) -> AppResult<Vec<PublishedReportSummary>> {
        let reports = list_s3_reports(self.connection(), case_id).await?;
        Ok(reports.iter().map(to_published_summary).collect())
    }

    pub async fn get_latest_published(&self, case_id: i32) -> AppResult<Option<s3_report::Model>> {
        find_latest_published(self.connection(), case_id).await
    }

    pub async fn get_published_report_by_guid(&self, guid: &str) -> AppResult<s3_report::Model> {
        S3Report::find()
            .filter(s3_report::Column::Guid.eq(guid))
            .one(self.connection())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Published report {}", guid)))
    }

    /// Every published report, for blob store maintenance.
    pub async fn list_all_s3_reports(&self) -> AppResult<Vec<s3_report::Model>> {
        Ok(S3Report::find()
            .order_by_asc(s3_report::Column::CaseId)
            .order_by_asc(s3_report::Column::Version)
            .all(self.connection())
            .await?)
    }
}
