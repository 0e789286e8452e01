//! Create equality-body retests.

use sea_orm_migration::prelude::*;

use super::{create_entity_table, drop_entity_table};
use crate::entity::{retest, retest_check_result, retest_page};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, retest::Entity).await?;
        create_entity_table(manager, retest_page::Entity).await?;
        create_entity_table(manager, retest_check_result::Entity).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_retests_case_id_within_case")
                    .table(retest::Entity)
                    .col(retest::Column::CaseId)
                    .col(retest::Column::IdWithinCase)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, retest_check_result::Entity).await?;
        drop_entity_table(manager, retest_page::Entity).await?;
        drop_entity_table(manager, retest::Entity).await
    }
}
