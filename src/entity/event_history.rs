//! Append-only create/update log with field-level differences.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::{EntityRef, EntityType, HistoryEventType};

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub entity_type: EntityType,
    pub entity_id: i32,
    /// Owning case, for the case history view.
    pub case_id: Option<i32>,
    pub event_type: HistoryEventType,
    pub author_id: Option<i32>,
    pub created: DateTimeUtc,
    #[sea_orm(column_type = "Json")]
    pub difference: JsonValue,
}

impl Model {
    pub fn entity(&self) -> EntityRef {
        EntityRef::from_parts(self.entity_type, self.entity_id)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
