//! Entities a sitemap is hydrated against.

use serde::Serialize;
use serde_json::Value;

use crate::db::{self, DbPool};
use crate::entity::{audit, case, page, retest, retest_page};
use crate::error::{AppError, AppResult};
use crate::models::AuditData;

use super::tree::InstanceClass;

/// An entity bound to a page, in its JSON form plus derived flags.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundInstance {
    pub class: InstanceClass,
    pub id: i32,
    pub value: Value,
}

impl BoundInstance {
    pub fn new<T: Serialize>(class: InstanceClass, id: i32, model: &T) -> AppResult<Self> {
        let value = match serde_json::to_value(model)? {
            Value::Object(map) => Value::Object(map),
            other => {
                return Err(AppError::InvalidInput(format!(
                    "Expected an object for {:?}, got {}",
                    class, other
                )));
            }
        };
        Ok(Self { class, id, value })
    }

    /// Add a derived field.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        if let Value::Object(map) = &mut self.value {
            map.insert(field.to_string(), value.into());
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.value.get(field)
    }

    /// Whether `field` is set: not null, false, empty or zero.
    pub fn is_truthy(&self, field: &str) -> bool {
        truthy(self.get(field))
    }
}

pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// Everything reachable from the page being viewed.
///
/// Without a case every field except `current` is empty.
#[derive(Debug, Clone, Default)]
pub struct SitemapContext {
    pub current: Option<BoundInstance>,
    pub case: Option<BoundInstance>,
    pub audit: Option<BoundInstance>,
    /// The retest being viewed, if any.
    pub retest: Option<BoundInstance>,
    pub audit_pages: Vec<BoundInstance>,
    pub audit_retest_pages: Vec<BoundInstance>,
    pub contacts: Vec<BoundInstance>,
    pub retests: Vec<BoundInstance>,
    pub retest_pages: Vec<BoundInstance>,
    pub correspondence: Vec<BoundInstance>,
}

impl SitemapContext {
    /// Instance bound to pages of `class` without enumeration.
    pub fn instance_for(&self, class: InstanceClass) -> Option<&BoundInstance> {
        let bound = match class {
            InstanceClass::Case => self.case.as_ref(),
            InstanceClass::Audit => self.audit.as_ref(),
            InstanceClass::Retest => self.retest.as_ref(),
            _ => None,
        };
        bound.or_else(|| self.current.as_ref().filter(|c| c.class == class))
    }

    pub fn is_case_scoped(&self) -> bool {
        self.case.is_some()
    }
}

fn bind_page(page: &page::Model) -> AppResult<BoundInstance> {
    Ok(BoundInstance::new(InstanceClass::Page, page.id, page)?.with("page_title", page.page_title()))
}

fn bind_case(case: &case::Model, has_audit: bool, has_contacts: bool) -> AppResult<BoundInstance> {
    Ok(BoundInstance::new(InstanceClass::Case, case.id, case)?
        .with("has_no_audit", !has_audit)
        .with("has_no_contacts", !has_contacts))
}

fn bind_audit(audit: &audit::Model) -> AppResult<BoundInstance> {
    Ok(BoundInstance::new(InstanceClass::Audit, audit.id, audit)?
        .with("uses_legacy_statement", audit.uses_legacy_statement()))
}

fn bind_retest_page(
    retest_page: &retest_page::Model,
    audit_data: Option<&AuditData>,
) -> AppResult<BoundInstance> {
    let title = audit_data
        .and_then(|data| data.page(retest_page.page_id))
        .map(|p| p.page_title())
        .unwrap_or_default();
    Ok(BoundInstance::new(InstanceClass::RetestPage, retest_page.id, retest_page)?
        .with("page_title", title))
}

/// Case owning the instance, plus the retest when one is being viewed.
async fn owning_case(
    pool: &DbPool,
    class: InstanceClass,
    id: i32,
) -> AppResult<(i32, Option<retest::Model>)> {
    let conn = pool.connection();
    Ok(match class {
        InstanceClass::Case => (db::cases::find_case(conn, id).await?.id, None),
        InstanceClass::Audit => (db::audits::find_audit(conn, id).await?.case_id, None),
        InstanceClass::Page => {
            let page = db::audits::find_page(conn, id).await?;
            (db::audits::find_audit(conn, page.audit_id).await?.case_id, None)
        }
        InstanceClass::Contact => (db::contacts::find_contact(conn, id).await?.case_id, None),
        InstanceClass::EqualityBodyCorrespondence => {
            (db::contacts::find_correspondence(conn, id).await?.case_id, None)
        }
        InstanceClass::Retest => {
            let retest = db::retests::find_retest(conn, id).await?;
            (retest.case_id, Some(retest))
        }
        InstanceClass::RetestPage => {
            let retest_page = db::retests::find_retest_page(conn, id).await?;
            let retest = db::retests::find_retest(conn, retest_page.retest_id).await?;
            (retest.case_id, Some(retest))
        }
    })
}

/// Load the context around instance `id` of `class`.
pub async fn load_context(pool: &DbPool, class: InstanceClass, id: i32) -> AppResult<SitemapContext> {
    let (case_id, retest) = owning_case(pool, class, id).await?;

    let case = pool.get_case(case_id).await?;
    let audit = pool.get_audit_for_case(case_id).await?;
    let audit_data = match &audit {
        Some(audit) => Some(pool.get_audit_data(audit.id).await?),
        None => None,
    };
    let contacts = pool.list_contacts(case_id).await?;

    let mut context = SitemapContext {
        case: Some(bind_case(&case, audit.is_some(), !contacts.is_empty())?),
        audit: audit.as_ref().map(bind_audit).transpose()?,
        ..Default::default()
    };

    if let Some(data) = &audit_data {
        context.audit_pages = data
            .testable_pages()
            .into_iter()
            .map(bind_page)
            .collect::<AppResult<_>>()?;
        context.audit_retest_pages = data
            .retestable_pages()
            .into_iter()
            .map(bind_page)
            .collect::<AppResult<_>>()?;
    }

    context.contacts = contacts
        .iter()
        .map(|c| BoundInstance::new(InstanceClass::Contact, c.id, c))
        .collect::<AppResult<_>>()?;

    context.retests = pool
        .list_retests(case_id)
        .await?
        .iter()
        .filter(|r| !r.is_original_test())
        .map(|r| BoundInstance::new(InstanceClass::Retest, r.id, r))
        .collect::<AppResult<_>>()?;

    context.correspondence = pool
        .list_correspondence(case_id)
        .await?
        .iter()
        .map(|c| {
            Ok(BoundInstance::new(InstanceClass::EqualityBodyCorrespondence, c.id, c)?
                .with("correspondence_type_label", c.correspondence_type.label()))
        })
        .collect::<AppResult<_>>()?;

    if let Some(retest) = retest {
        let pages = db::retests::list_retest_pages(pool.connection(), retest.id).await?;
        context.retest_pages = pages
            .iter()
            .map(|p| bind_retest_page(p, audit_data.as_ref()))
            .collect::<AppResult<_>>()?;
        context.retest = Some(BoundInstance::new(InstanceClass::Retest, retest.id, &retest)?);
    }

    context.current = match class {
        InstanceClass::Case => context.case.clone(),
        InstanceClass::Audit => context.audit.clone(),
        InstanceClass::Retest => context.retest.clone(),
        InstanceClass::Page => Some(bind_page(audit_page(audit_data.as_ref(), id)?)?),
        InstanceClass::RetestPage => context.retest_pages.iter().find(|p| p.id == id).cloned(),
        InstanceClass::Contact => context.contacts.iter().find(|c| c.id == id).cloned(),
        InstanceClass::EqualityBodyCorrespondence => {
            context.correspondence.iter().find(|c| c.id == id).cloned()
        }
    };

    Ok(context)
}

/// A page of the audit, including ones excluded from testing.
fn audit_page(audit_data: Option<&AuditData>, id: i32) -> AppResult<&page::Model> {
    audit_data
        .and_then(|data| data.page(id))
        .ok_or_else(|| AppError::NotFound(format!("Page {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[test]
    fn test_truthiness() {
        assert!(!truthy(None));
        assert!(!truthy(Some(&Value::Null)));
        assert!(!truthy(Some(&json!(false))));
        assert!(!truthy(Some(&json!(""))));
        assert!(!truthy(Some(&json!(0))));
        assert!(truthy(Some(&json!("2024-01-02"))));
        assert!(truthy(Some(&json!(true))));
        assert!(truthy(Some(&json!(3))));
    }

    #[test]
    fn test_instance_for_falls_back_to_current() {
        let contact = BoundInstance::new(InstanceClass::Contact, 4, &json!({"name": "Ann"})).unwrap();
        let context = SitemapContext {
            current: Some(contact.clone()),
            ..Default::default()
        };
        assert_eq!(context.instance_for(InstanceClass::Contact), Some(&contact));
        assert!(context.instance_for(InstanceClass::Case).is_none());

        let mut value = Map::new();
        value.insert("x".into(), json!(1));
        let derived = BoundInstance::new(InstanceClass::Case, 1, &value)
            .unwrap()
            .with("has_no_audit", true);
        assert!(derived.is_truthy("has_no_audit"));
        assert!(derived.is_truthy("x"));
    }
}
