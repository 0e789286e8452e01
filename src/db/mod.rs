//! Database module providing connection management, migrations and queries.
//!
//! Each aggregate gets an `impl DbPool` block for reads used by handlers, and
//! connection-generic functions for writes that run inside a transaction.

pub mod audits;
pub mod cases;
pub mod catalogues;
pub mod contacts;
pub mod history;
pub mod reports;
pub mod retests;
pub mod tasks;
pub mod users;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::config::Config;
use crate::entity::{
    audit, case, check_result, comment, contact, equality_body_correspondence, page, retest,
    retest_check_result, retest_page, statement_check_result, zendesk_ticket,
};
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;
use crate::models::EntityRef;
use crate::services::history::diff;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration.
    pub async fn new(config: &Config) -> AppResult<Self> {
        Self::connect(
            &config.database_url,
            config.db_max_connections,
            config.db_min_connections,
        )
        .await
    }

    /// Connect to `url` with the given pool bounds.
    ///
    /// Tests pass `sqlite::memory:` with a single connection so every query
    /// sees the same in-memory database.
    pub async fn connect(url: &str, max_connections: u32, min_connections: u32) -> AppResult<Self> {
        let mut options = ConnectOptions::new(url.to_string());
        options
            .max_connections(max_connections)
            .min_connections(min_connections)
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(DbPool { conn })
    }

    /// Get access to the connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Start a transaction. Dropping it without commit rolls back.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.conn
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to start transaction: {}", e)))
    }

    /// Apply all pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        let pending = Migrator::get_pending_migrations(&self.conn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read migrations: {}", e)))?;
        info!("{} migration(s) pending", pending.len());

        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))?;
        Ok(())
    }
}

/// Commit a transaction, mapping the error.
pub async fn commit(txn: DatabaseTransaction) -> AppResult<()> {
    txn.commit()
        .await
        .map_err(|e| AppError::Database(format!("Failed to commit transaction: {}", e)))
}

/// Write `model` only if the stored row still has `expected_version`.
///
/// The caller has already set the new version on `model`. Zero matched rows
/// means someone else saved first, reported as `AppError::StaleVersion`.
pub async fn versioned_update<E, A, C>(
    conn: &C,
    entity: &'static str,
    model: E::Model,
    id_column: E::Column,
    version_column: E::Column,
    id: i32,
    expected_version: i32,
) -> AppResult<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E> + From<E::Model>,
{
    let active = A::from(model).reset_all();
    let result = E::update_many()
        .set(active)
        .filter(id_column.eq(id))
        .filter(version_column.eq(expected_version))
        .exec(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update {} {}: {}", entity, id, e)))?;

    if result.rows_affected == 0 {
        return Err(AppError::StaleVersion {
            entity,
            id,
            expected: expected_version,
        });
    }

    Ok(())
}

/// Models carrying an optimistic-concurrency `version`.
pub trait Versioned {
    fn version(&self) -> i32;

    fn set_version(&mut self, version: i32);

    /// Stamp the modification time, for models that track one.
    fn touch(&mut self, _now: DateTime<Utc>) {}
}

macro_rules! impl_versioned {
    ($($module:ident),+ ; touch) => {
        $(
            impl Versioned for $module::Model {
                fn version(&self) -> i32 {
                    self.version
                }

                fn set_version(&mut self, version: i32) {
                    self.version = version;
                }

                fn touch(&mut self, now: DateTime<Utc>) {
                    self.updated = now;
                }
            }
        )+
    };
    ($($module:ident),+) => {
        $(
            impl Versioned for $module::Model {
                fn version(&self) -> i32 {
                    self.version
                }

                fn set_version(&mut self, version: i32) {
                    self.version = version;
                }
            }
        )+
    };
}

impl_versioned!(
    audit,
    case,
    check_result,
    comment,
    contact,
    equality_body_correspondence,
    page,
    retest,
    zendesk_ticket;
    touch
);
impl_versioned!(retest_check_result, retest_page, statement_check_result);

/// A successful versioned save.
#[derive(Debug, Clone)]
pub struct Saved<M> {
    pub model: M,
    pub difference: Map<String, Value>,
}

/// Save `edited` over `current` with a version bump and a history row.
///
/// Returns `None` without touching the database when nothing changed.
#[allow(clippy::too_many_arguments)]
pub async fn save_versioned<E, A, C>(
    conn: &C,
    reference: EntityRef,
    case_id: Option<i32>,
    author_id: Option<i32>,
    current: &E::Model,
    mut edited: E::Model,
    id_column: E::Column,
    version_column: E::Column,
) -> AppResult<Option<Saved<E::Model>>>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Versioned + Serialize + Clone,
    A: ActiveModelTrait<Entity = E> + From<E::Model>,
{
    let difference = diff(current, &edited)?;
    if difference.is_empty() {
        return Ok(None);
    }

    let expected = current.version();
    edited.set_version(expected + 1);
    edited.touch(Utc::now());

    versioned_update::<E, A, C>(
        conn,
        reference.entity_type().label(),
        edited.clone(),
        id_column,
        version_column,
        reference.id(),
        expected,
    )
    .await?;
    history::record_update(conn, reference, case_id, author_id, difference.clone()).await?;

    Ok(Some(Saved {
        model: edited,
        difference,
    }))
}

/// Check a client-supplied version against the stored one before any work.
pub fn check_version(
    entity: &'static str,
    id: i32,
    stored: i32,
    expected: i32,
) -> AppResult<()> {
    if stored != expected {
        return Err(AppError::StaleVersion {
            entity,
            id,
            expected,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_version() {
        assert!(check_version("Case", 1, 3, 3).is_ok());
        assert!(matches!(
            check_version("Case", 1, 4, 3),
            Err(AppError::StaleVersion { expected: 3, .. })
        ));
    }
}
