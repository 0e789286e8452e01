//! Create cases and their direct children, tasks and the event history.

use sea_orm_migration::prelude::*;

use super::{create_entity_table, drop_entity_table};
use crate::entity::{
    case, case_event, comment, contact, equality_body_correspondence, event_history, task,
    zendesk_ticket,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_entity_table(manager, case::Entity).await?;
        create_entity_table(manager, case_event::Entity).await?;
        create_entity_table(manager, contact::Entity).await?;
        create_entity_table(manager, comment::Entity).await?;
        create_entity_table(manager, zendesk_ticket::Entity).await?;
        create_entity_table(manager, equality_body_correspondence::Entity).await?;
        create_entity_table(manager, task::Entity).await?;
        create_entity_table(manager, event_history::Entity).await?;

        // Case numbers are allocated per variant
        manager
            .create_index(
                Index::create()
                    .name("idx_cases_variant_case_number")
                    .table(case::Entity)
                    .col(case::Column::Variant)
                    .col(case::Column::CaseNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cases_status")
                    .table(case::Entity)
                    .col(case::Column::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cases_auditor_id")
                    .table(case::Entity)
                    .col(case::Column::AuditorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_history_entity")
                    .table(event_history::Entity)
                    .col(event_history::Column::EntityType)
                    .col(event_history::Column::EntityId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_history_case_id")
                    .table(event_history::Entity)
                    .col(event_history::Column::CaseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tasks_user_date")
                    .table(task::Entity)
                    .col(task::Column::UserId)
                    .col(task::Column::Date)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_entity_table(manager, event_history::Entity).await?;
        drop_entity_table(manager, task::Entity).await?;
        drop_entity_table(manager, equality_body_correspondence::Entity).await?;
        drop_entity_table(manager, zendesk_ticket::Entity).await?;
        drop_entity_table(manager, comment::Entity).await?;
        drop_entity_table(manager, contact::Entity).await?;
        drop_entity_table(manager, case_event::Entity).await?;
        drop_entity_table(manager, case::Entity).await
    }
}
