//! Page of an audited website.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::PageType;

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub audit_id: i32,
    pub version: i32,
    pub page_type: PageType,
    pub name: String,
    pub url: String,
    pub location: String,
    pub not_found: bool,
    pub complete_date: Option<Date>,
    pub retest_complete_date: Option<Date>,
    pub retest_page_missing_date: Option<Date>,
    pub created: DateTimeUtc,
    pub updated: DateTimeUtc,
    pub is_deleted: bool,
}

impl Model {
    /// Included in testing: live, found and with a URL.
    pub fn is_testable(&self) -> bool {
        !self.is_deleted && !self.not_found && !self.url.trim().is_empty()
    }

    /// Display title, e.g. `Contact page` or a named extra page.
    pub fn page_title(&self) -> String {
        if self.name.is_empty() {
            self.page_type.label().to_string()
        } else if self.page_type == PageType::Extra {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.page_type.label().to_lowercase())
        }
    }

    /// Ordering key used by test, report and retest views.
    pub fn sort_key(&self) -> (usize, i32) {
        (self.page_type.position(), self.id)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::audit::Entity",
        from = "Column::AuditId",
        to = "super::audit::Column::Id"
    )]
    Audit,
    #[sea_orm(has_many = "super::check_result::Entity")]
    CheckResults,
}

impl Related<super::audit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Audit.def()
    }
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

    #[test]
    fn test_not_found_page_is_not_testable() {
        let page = Model {
            url: "https://acme.example/contact".to_string(),
            not_found: true,
            ..Default::default()
        };
        assert!(!page.is_testable());

        let page = Model {
            not_found: false,
            ..page
        };
        assert!(page.is_testable());
    }

    #[test]
    fn test_page_title() {
        let page = Model {
            page_type: PageType::Extra,
            name: "Search results".to_string(),
            ..Default::default()
        };
        assert_eq!(page.page_title(), "Search results");

        let page = Model {
            page_type: PageType::Contact,
            ..Default::default()
        };
        assert_eq!(page.page_title(), "Contact page");
    }
}
