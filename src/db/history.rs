//! Event history and case event persistence.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::entity::case_event::{self, Entity as CaseEvent};
use crate::entity::event_history::{self, Entity as EventHistory};
use crate::error::{AppError, AppResult};
use crate::models::{CaseEventType, EntityRef, HistoryEventType};
use crate::services::history::snapshot;

use super::DbPool;

/// Record the creation of `model`.
pub async fn record_create<C, T>(
    conn: &C,
    entity: EntityRef,
    case_id: Option<i32>,
    author_id: Option<i32>,
    model: &T,
) -> AppResult<event_history::Model>
where
    C: ConnectionTrait,
    T: Serialize,
{
    insert_event(
        conn,
        entity,
        case_id,
        author_id,
        HistoryEventType::Create,
        snapshot(model)?,
    )
    .await
}

/// Record an update with its `{field: [old, new]}` difference.
pub async fn record_update<C>(
    conn: &C,
    entity: EntityRef,
    case_id: Option<i32>,
    author_id: Option<i32>,
    difference: Map<String, Value>,
) -> AppResult<event_history::Model>
where
    C: ConnectionTrait,
{
    insert_event(
        conn,
        entity,
        case_id,
        author_id,
        HistoryEventType::Update,
        Value::Object(difference),
    )
    .await
}

async fn insert_event<C: ConnectionTrait>(
    conn: &C,
    entity: EntityRef,
    case_id: Option<i32>,
    author_id: Option<i32>,
    event_type: HistoryEventType,
    difference: Value,
) -> AppResult<event_history::Model> {
    event_history::ActiveModel {
        entity_type: Set(entity.entity_type()),
        entity_id: Set(entity.id()),
        case_id: Set(case_id),
        event_type: Set(event_type),
        author_id: Set(author_id),
        created: Set(Utc::now()),
        difference: Set(difference),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| AppError::Database(format!("Failed to record event history: {}", e)))
}

/// Append a case event.
pub async fn record_case_event<C: ConnectionTrait>(
    conn: &C,
    case_id: i32,
    event_type: CaseEventType,
    message: impl Into<String>,
    done_by_id: Option<i32>,
) -> AppResult<case_event::Model> {
    case_event::ActiveModel {
        case_id: Set(case_id),
        event_type: Set(event_type),
        message: Set(message.into()),
        done_by_id: Set(done_by_id),
        created: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| AppError::Database(format!("Failed to record case event: {}", e)))
}

impl DbPool {
    /// History rows of one entity, oldest first.
    pub async fn list_entity_history(&self, entity: EntityRef) -> AppResult<Vec<event_history::Model>> {
        EventHistory::find()
            .filter(event_history::Column::EntityType.eq(entity.entity_type()))
            .filter(event_history::Column::EntityId.eq(entity.id()))
            .order_by_asc(event_history::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list event history: {}", e)))
    }

    /// History rows of a case and all of its children, oldest first.
    pub async fn list_case_history(&self, case_id: i32) -> AppResult<Vec<event_history::Model>> {
        EventHistory::find()
            .filter(event_history::Column::CaseId.eq(case_id))
            .order_by_asc(event_history::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list case history: {}", e)))
    }

    pub async fn list_case_events(&self, case_id: i32) -> AppResult<Vec<case_event::Model>> {
        CaseEvent::find()
            .filter(case_event::Column::CaseId.eq(case_id))
            .order_by_asc(case_event::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list case events: {}", e)))
    }
}
