//! WCAG definition catalogue entry, valid on `[date_start, date_end)`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::WcagType;
use crate::models::catalogue::in_validity_window;

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wcag_definitions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub wcag_type: WcagType,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub url_on_w3: String,
    #[sea_orm(column_type = "Text")]
    pub report_boilerplate: String,
    pub date_start: Date,
    pub date_end: Option<Date>,
    pub created: DateTimeUtc,
}

impl Model {
    pub fn is_valid_on(&self, date: Date) -> bool {
        in_validity_window(Some(self.date_start), self.date_end, date)
    }

    /// Catalogue order: type, then the success criterion number leading the
    /// name compared numerically (`1.4.3` before `1.4.10`), then name.
    pub fn catalogue_key(&self) -> (WcagType, Vec<u32>, String, i32) {
        let criterion: Vec<u32> = self
            .name
            .split_whitespace()
            .next()
            .map(|token| {
                token
                    .split('.')
                    .map_while(|part| part.parse::<u32>().ok())
                    .collect()
            })
            .unwrap_or_default();
        (self.wcag_type, criterion, self.name.clone(), self.id)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::check_result::Entity")]
    CheckResults,
}

impl Related<super::check_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckResults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(id: i32, wcag_type: WcagType, name: &str) -> Model {
        Model {
            id,
            wcag_type,
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_catalogue_order_ignores_insertion_order() {
        let mut definitions = vec![
            definition(1, WcagType::Manual, "4.1.2 Name, role, value"),
            definition(2, WcagType::Manual, "1.4.10 Reflow"),
            definition(3, WcagType::Manual, "1.4.3 Contrast (minimum)"),
            definition(4, WcagType::Manual, "1.1.1 Non-text content (2024 revision)"),
            definition(5, WcagType::Axe, "Missing document language"),
        ];
        definitions.sort_by_key(Model::catalogue_key);
        let ids: Vec<i32> = definitions.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1, 5]);
    }
}
