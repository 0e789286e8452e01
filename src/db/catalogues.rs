//! Database operations for the reference catalogues.
//!
//! Catalogue rows are never edited in place; a replacement is added and the
//! old row gets a `date_end`.

use chrono::{NaiveDate, Utc};
use sea_orm::*;

use crate::entity::base_template::{self, Entity as BaseTemplate};
use crate::entity::email_template::{self, Entity as EmailTemplate};
use crate::entity::sector::{self, Entity as Sector};
use crate::entity::statement_check::{self, Entity as StatementCheck};
use crate::entity::sub_category::{self, Entity as SubCategory};
use crate::entity::wcag_definition::{self, Entity as WcagDefinition};
use crate::error::{AppError, AppResult};
use crate::models::catalogue::{
    CreateEmailTemplateRequest, CreateStatementCheckRequest, CreateWcagDefinitionRequest,
};
use crate::models::{EmailTemplateType, TemplateType};

use super::DbPool;

/// WCAG definitions valid on `date`, in catalogue order.
pub async fn valid_wcag_definitions<C: ConnectionTrait>(
    conn: &C,
    date: NaiveDate,
) -> AppResult<Vec<wcag_definition::Model>> {
    let mut definitions = WcagDefinition::find()
        .filter(wcag_definition::Column::DateStart.lte(date))
        .filter(
            Condition::any()
                .add(wcag_definition::Column::DateEnd.is_null())
                .add(wcag_definition::Column::DateEnd.gt(date)),
        )
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list WCAG definitions: {}", e)))?;
    definitions.sort_by_key(wcag_definition::Model::catalogue_key);
    Ok(definitions)
}

/// Statement checks valid on `date`, by check type then position.
pub async fn valid_statement_checks<C: ConnectionTrait>(
    conn: &C,
    date: NaiveDate,
) -> AppResult<Vec<statement_check::Model>> {
    let mut checks = StatementCheck::find()
        .filter(statement_check::Column::DateStart.lte(date))
        .filter(
            Condition::any()
                .add(statement_check::Column::DateEnd.is_null())
                .add(statement_check::Column::DateEnd.gt(date)),
        )
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list statement checks: {}", e)))?;
    checks.sort_by_key(|c| (c.check_type, c.position, c.id));
    Ok(checks)
}

/// Report base templates in position order.
pub async fn list_base_templates<C: ConnectionTrait>(
    conn: &C,
) -> AppResult<Vec<base_template::Model>> {
    BaseTemplate::find()
        .order_by_asc(base_template::Column::Position)
        .order_by_asc(base_template::Column::Id)
        .all(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list base templates: {}", e)))
}

/// A base template row loaded from the templates CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseTemplateRow {
    pub name: String,
    pub template_type: TemplateType,
    pub position: i32,
    pub content: String,
}

impl DbPool {
    pub async fn list_wcag_definitions(
        &self,
        on: Option<NaiveDate>,
    ) -> AppResult<Vec<wcag_definition::Model>> {
        match on {
            Some(date) => valid_wcag_definitions(self.connection(), date).await,
            None => {
                let mut definitions = WcagDefinition::find().all(self.connection()).await?;
                definitions.sort_by_key(wcag_definition::Model::catalogue_key);
                Ok(definitions)
            }
        }
    }

    pub async fn create_wcag_definition(
        &self,
        request: &CreateWcagDefinitionRequest,
    ) -> AppResult<wcag_definition::Model> {
        wcag_definition::ActiveModel {
            wcag_type: Set(request.wcag_type),
            name: Set(request.name.clone()),
            description: Set(request.description.clone()),
            url_on_w3: Set(request.url_on_w3.clone()),
            report_boilerplate: Set(request.report_boilerplate.clone()),
            date_start: Set(request.date_start.unwrap_or_else(|| Utc::now().date_naive())),
            date_end: Set(None),
            created: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.connection())
        .await
        .map_err(|e| AppError::Database(format!("Failed to create WCAG definition: {}", e)))
    }

    /// Close a WCAG definition's validity window.
    pub async fn end_wcag_definition(
        &self,
        id: i32,
        date_end: NaiveDate,
    ) -> AppResult<wcag_definition::Model> {
        let definition = WcagDefinition::find_by_id(id)
            .one(self.connection())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("WCAG definition {}", id)))?;
        if date_end <= definition.date_start {
            return Err(AppError::field("date_end", "End date must be after the start date"));
        }
        let mut active: wcag_definition::ActiveModel = definition.into();
        active.date_end = Set(Some(date_end));
        Ok(active.update(self.connection()).await?)
    }

    pub async fn list_statement_checks(
        &self,
        on: Option<NaiveDate>,
    ) -> AppResult<Vec<statement_check::Model>> {
        match on {
            Some(date) => valid_statement_checks(self.connection(), date).await,
            None => {
                let mut checks = StatementCheck::find().all(self.connection()).await?;
                checks.sort_by_key(|c| (c.check_type, c.position, c.id));
                Ok(checks)
            }
        }
    }

    pub async fn create_statement_check(
        &self,
        request: &CreateStatementCheckRequest,
    ) -> AppResult<statement_check::Model> {
        let position = match request.position {
            Some(position) => position,
            None => {
                let last = StatementCheck::find()
                    .filter(statement_check::Column::CheckType.eq(request.check_type))
                    .order_by_desc(statement_check::Column::Position)
                    .one(self.connection())
                    .await?;
                last.map(|c| c.position + 1).unwrap_or(1)
            }
        };

        statement_check::ActiveModel {
            check_type: Set(request.check_type),
            position: Set(position),
            label: Set(request.label.clone()),
            success_criteria: Set(request.success_criteria.clone()),
            report_text: Set(request.report_text.clone()),
            date_start: Set(request.date_start.unwrap_or_else(|| Utc::now().date_naive())),
            date_end: Set(None),
            created: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.connection())
        .await
        .map_err(|e| AppError::Database(format!("Failed to create statement check: {}", e)))
    }

    pub async fn end_statement_check(
        &self,
        id: i32,
        date_end: NaiveDate,
    ) -> AppResult<statement_check::Model> {
        let check = StatementCheck::find_by_id(id)
            .one(self.connection())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Statement check {}", id)))?;
        if date_end <= check.date_start {
            return Err(AppError::field("date_end", "End date must be after the start date"));
        }
        let mut active: statement_check::ActiveModel = check.into();
        active.date_end = Set(Some(date_end));
        Ok(active.update(self.connection()).await?)
    }

    /// Email templates valid on `on` (or all of them), optionally of one type.
    pub async fn list_email_templates(
        &self,
        on: Option<NaiveDate>,
        template_type: Option<EmailTemplateType>,
    ) -> AppResult<Vec<email_template::Model>> {
        let mut select = EmailTemplate::find();
        if let Some(date) = on {
            select = select.filter(email_template::Column::DateStart.lte(date)).filter(
                Condition::any()
                    .add(email_template::Column::DateEnd.is_null())
                    .add(email_template::Column::DateEnd.gt(date)),
            );
        }
        if let Some(template_type) = template_type {
            select = select.filter(email_template::Column::TemplateType.eq(template_type));
        }
        Ok(select
            .order_by_asc(email_template::Column::Id)
            .all(self.connection())
            .await?)
    }

    pub async fn get_email_template(&self, id: i32) -> AppResult<email_template::Model> {
        EmailTemplate::find_by_id(id)
            .one(self.connection())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Email template {}", id)))
    }

    pub async fn create_email_template(
        &self,
        request: &CreateEmailTemplateRequest,
    ) -> AppResult<email_template::Model> {
        // Reject templates that do not parse so rendering never fails later.
        let mut tera = tera::Tera::default();
        tera.add_raw_template("subject", &request.subject)
            .map_err(|e| AppError::field("subject", format!("Invalid template: {}", e)))?;
        tera.add_raw_template("content", &request.content)
            .map_err(|e| AppError::field("content", format!("Invalid template: {}", e)))?;

        email_template::ActiveModel {
            name: Set(request.name.clone()),
            template_type: Set(request.template_type),
            subject: Set(request.subject.clone()),
            content: Set(request.content.clone()),
            date_start: Set(request.date_start.unwrap_or_else(|| Utc::now().date_naive())),
            date_end: Set(None),
            created: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.connection())
        .await
        .map_err(|e| AppError::Database(format!("Failed to create email template: {}", e)))
    }

    pub async fn list_base_templates(&self) -> AppResult<Vec<base_template::Model>> {
        list_base_templates(self.connection()).await
    }

    /// Insert or update base templates by name. With `replace_all`, templates
    /// missing from `rows` are removed.
    ///
    /// Returns `(created, updated)` counts.
    pub async fn upsert_base_templates(
        &self,
        rows: &[BaseTemplateRow],
        replace_all: bool,
    ) -> AppResult<(usize, usize)> {
        let txn = self.begin().await?;
        let existing = list_base_templates(&txn).await?;

        let mut created = 0;
        let mut updated = 0;
        for row in rows {
            match existing.iter().find(|t| t.name == row.name) {
                Some(template) => {
                    if template.template_type == row.template_type
                        && template.position == row.position
                        && template.content == row.content
                    {
                        continue;
                    }
                    let mut active: base_template::ActiveModel = template.clone().into();
                    active.template_type = Set(row.template_type);
                    active.position = Set(row.position);
                    active.content = Set(row.content.clone());
                    active.update(&txn).await?;
                    updated += 1;
                }
                None => {
                    base_template::ActiveModel {
                        name: Set(row.name.clone()),
                        template_type: Set(row.template_type),
                        position: Set(row.position),
                        content: Set(row.content.clone()),
                        created: Set(Utc::now()),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                    created += 1;
                }
            }
        }

        if replace_all {
            let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
            for stale in existing.iter().filter(|t| !names.contains(&t.name.as_str())) {
                BaseTemplate::delete_by_id(stale.id).exec(&txn).await?;
            }
        }

        super::commit(txn).await?;
        Ok((created, updated))
    }

    pub async fn list_sectors(&self) -> AppResult<Vec<sector::Model>> {
        Ok(Sector::find()
            .order_by_asc(sector::Column::Name)
            .all(self.connection())
            .await?)
    }

    pub async fn list_sub_categories(&self) -> AppResult<Vec<sub_category::Model>> {
        Ok(SubCategory::find()
            .order_by_asc(sub_category::Column::Name)
            .all(self.connection())
            .await?)
    }

    pub async fn create_sector(&self, name: &str) -> AppResult<sector::Model> {
        Ok(sector::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(self.connection())
        .await?)
    }
}
