//! Create users, platform settings and the reference catalogues.

use sea_orm_migration::prelude::*;

use super::{create_entity_table, drop_entity_table};
use crate::entity::{
    base_template, email_template, notification_setting, platform, sector, statement_check,
    sub_category, user, wcag_definition,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, user::Entity).await?;
        create_entity_table(manager, notification_setting::Entity).await?;
        create_entity_table(manager, platform::Entity).await?;
        create_entity_table(manager, sector::Entity).await?;
        create_entity_table(manager, sub_category::Entity).await?;
        create_entity_table(manager, wcag_definition::Entity).await?;
        create_entity_table(manager, statement_check::Entity).await?;
        create_entity_table(manager, email_template::Entity).await?;
        create_entity_table(manager, base_template::Entity).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_wcag_definitions_window")
                    .table(wcag_definition::Entity)
                    .col(wcag_definition::Column::DateStart)
                    .col(wcag_definition::Column::DateEnd)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_statement_checks_position")
                    .table(statement_check::Entity)
                    .col(statement_check::Column::CheckType)
                    .col(statement_check::Column::Position)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, base_template::Entity).await?;
        drop_entity_table(manager, email_template::Entity).await?;
        drop_entity_table(manager, statement_check::Entity).await?;
        drop_entity_table(manager, wcag_definition::Entity).await?;
        drop_entity_table(manager, sub_category::Entity).await?;
        drop_entity_table(manager, sector::Entity).await?;
        drop_entity_table(manager, platform::Entity).await?;
        drop_entity_table(manager, notification_setting::Entity).await?;
        drop_entity_table(manager, user::Entity).await
    }
}
