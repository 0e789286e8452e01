//! Create reports, sections, table rows and published reports.

use sea_orm_migration::prelude::*;

use super::{create_entity_table, drop_entity_table};
use crate::entity::{report, s3_report, section, table_row};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, report::Entity).await?;
        create_entity_table(manager, section::Entity).await?;
        create_entity_table(manager, table_row::Entity).await?;
        create_entity_table(manager, s3_report::Entity).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sections_report_position")
                    .table(section::Entity)
                    .col(section::Column::ReportId)
                    .col(section::Column::Position)
                    .to_owned(),
            )
            .await?;

        // Published versions are numbered per case
        manager
            .create_index(
                Index::create()
                    .name("idx_s3_reports_case_version")
                    .table(s3_report::Entity)
                    .col(s3_report::Column::CaseId)
                    .col(s3_report::Column::Version)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, s3_report::Entity).await?;
        drop_entity_table(manager, table_row::Entity).await?;
        drop_entity_table(manager, section::Entity).await?;
        drop_entity_table(manager, report::Entity).await
    }
}
