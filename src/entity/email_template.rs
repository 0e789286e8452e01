//! Correspondence email template (tera source), date-window versioned.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::EmailTemplateType;

#[derive(Clone, Debug, Default, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "email_templates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub template_type: EmailTemplateType,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub date_start: Date,
    pub date_end: Option<Date>,
    pub created: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
