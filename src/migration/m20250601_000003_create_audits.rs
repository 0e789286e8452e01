//! Create audits, pages, check results and statement check results.

use sea_orm_migration::prelude::*;

use super::{create_entity_table, drop_entity_table};
use crate::entity::{audit, check_result, page, statement_check_result};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, audit::Entity).await?;
        create_entity_table(manager, page::Entity).await?;
        create_entity_table(manager, check_result::Entity).await?;
        create_entity_table(manager, statement_check_result::Entity).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pages_audit_id")
                    .table(page::Entity)
                    .col(page::Column::AuditId)
                    .to_owned(),
            )
            .await?;

        // One result per page and WCAG definition
        manager
            .create_index(
                Index::create()
                    .name("idx_check_results_page_wcag")
                    .table(check_result::Entity)
                    .col(check_result::Column::PageId)
                    .col(check_result::Column::WcagDefinitionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_statement_check_results_audit_id")
                    .table(statement_check_result::Entity)
                    .col(statement_check_result::Column::AuditId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, statement_check_result::Entity).await?;
        drop_entity_table(manager, check_result::Entity).await?;
        drop_entity_table(manager, page::Entity).await?;
        drop_entity_table(manager, audit::Entity).await
    }
}
