//! SeaORM database migrations.
//!
//! Tables are created from the entity definitions so the same migrator runs
//! against PostgreSQL in production and SQLite in tests.

pub use sea_orm_migration::prelude::*;

use sea_orm::{EntityTrait, Schema};

mod m20250601_000001_create_reference_tables;
mod m20250601_000002_create_cases;
mod m20250601_000003_create_audits;
mod m20250601_000004_create_reports;
mod m20250601_000005_create_retests;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_reference_tables::Migration),
            Box::new(m20250601_000002_create_cases::Migration),
            Box::new(m20250601_000003_create_audits::Migration),
            Box::new(m20250601_000004_create_reports::Migration),
            Box::new(m20250601_000005_create_retests::Migration),
        ]
    }
}

/// Create the table backing `entity`, including its foreign keys.
pub(crate) async fn create_entity_table<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let schema = Schema::new(manager.get_database_backend());
    manager
        .create_table(schema.create_table_from_entity(entity).if_not_exists().to_owned())
        .await
}

pub(crate) async fn drop_entity_table<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}
