//! Hydrates the page tree for the page being viewed.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

use super::context::{BoundInstance, SitemapContext};
use super::routes::{self, Kwargs};
use super::tree::{ChildSet, GroupType, PageKind, PlatformPage, PlatformPageGroup, Sitemap};

/// A visible page with its URL and completion state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HydratedPage {
    pub name: String,
    pub route_name: String,
    pub url: String,
    /// `None` when the page has no completion flag.
    pub complete: Option<bool>,
    pub is_current: bool,
    #[schema(no_recursion)]
    pub subpages: Vec<HydratedPage>,
}

impl HydratedPage {
    /// This page and its visible sub-pages, depth first.
    pub fn flatten(&self) -> Vec<&HydratedPage> {
        let mut pages = vec![self];
        for subpage in &self.subpages {
            pages.extend(subpage.flatten());
        }
        pages
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HydratedGroup {
    pub name: String,
    pub group_type: GroupType,
    pub pages: Vec<HydratedPage>,
    /// Visible pages and sub-pages carrying a completion flag.
    pub number_pages_and_subpages: usize,
    /// Those of them whose flag is set.
    pub number_complete: usize,
}

impl HydratedGroup {
    fn flatten(&self) -> Vec<&HydratedPage> {
        self.pages.iter().flat_map(|p| p.flatten()).collect()
    }

    fn contains_current(&self) -> bool {
        self.flatten().iter().any(|p| p.is_current)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HydratedSitemap {
    pub current_url: String,
    pub current_page_name: String,
    pub current_group_name: Option<String>,
    pub groups: Vec<HydratedGroup>,
    pub next_page_url: Option<String>,
}

static NAME_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(instance|case)\.([a-z0-9_]+)\}").expect("name placeholder regex is valid")
});

fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Fill `{instance.field}` and `{case.field}` placeholders in a page name.
pub fn substitute(
    template: &str,
    instance: Option<&BoundInstance>,
    case: Option<&BoundInstance>,
) -> String {
    NAME_PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| {
            let source = match &caps[1] {
                "instance" => instance,
                _ => case,
            };
            display(source.and_then(|s| s.get(&caps[2])))
        })
        .into_owned()
}

/// Path with any query string removed and a trailing slash.
fn normalise_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

fn children<'a>(set: ChildSet, context: &'a SitemapContext) -> &'a [BoundInstance] {
    match set {
        ChildSet::AuditPages => &context.audit_pages,
        ChildSet::AuditRetestPages => &context.audit_retest_pages,
        ChildSet::Contacts => &context.contacts,
        ChildSet::Retests => &context.retests,
        ChildSet::RetestPages => &context.retest_pages,
        ChildSet::EqualityBodyCorrespondence => &context.correspondence,
    }
}

struct Hydrator<'a> {
    context: &'a SitemapContext,
    current_url: String,
}

impl Hydrator<'_> {
    fn page_url(&self, page: &PlatformPage, instance: Option<&BoundInstance>) -> Option<String> {
        if page.kind == PageKind::PreviousCase {
            let url = display(instance?.get("previous_case_url"));
            return (!url.is_empty()).then_some(url);
        }
        let mut kwargs = Kwargs::new();
        if let Some(instance) = instance {
            kwargs.insert(page.url_kwarg_key.to_string(), instance.id);
        }
        routes::reverse(page.route_name, &kwargs)
    }

    /// Hydrate `page`, or `None` when it is hidden.
    ///
    /// A parent's instance is inherited by sub-pages of the same class.
    fn page(&self, page: &PlatformPage, parent: Option<&BoundInstance>) -> Option<HydratedPage> {
        let instance = match page.instance_class {
            None => None,
            Some(class) => Some(
                parent
                    .filter(|p| p.class == class)
                    .or_else(|| self.context.instance_for(class))?,
            ),
        };

        if let Some(flag) = page.show_flag_name
            && !instance.is_some_and(|i| i.is_truthy(flag))
        {
            return None;
        }

        let url = self.page_url(page, instance)?;
        let is_current = normalise_url(&url) == self.current_url;
        if page.visible_only_when_current && !is_current {
            return None;
        }

        let subpages = match page.kind {
            PageKind::Enumerate(set) => {
                let template = page.subpages.first()?;
                children(set, self.context)
                    .iter()
                    .filter_map(|child| self.page(template, Some(child)))
                    .collect()
            }
            _ => page
                .subpages
                .iter()
                .filter_map(|subpage| self.page(subpage, instance))
                .collect(),
        };

        Some(HydratedPage {
            name: substitute(page.name, instance, self.context.case.as_ref()),
            route_name: page.route_name.to_string(),
            url,
            complete: page
                .complete_flag_name
                .map(|flag| instance.is_some_and(|i| i.is_truthy(flag))),
            is_current,
            subpages,
        })
    }

    fn group(&self, group: &PlatformPageGroup) -> Option<HydratedGroup> {
        let pages: Vec<HydratedPage> = group
            .pages
            .iter()
            .filter_map(|page| self.page(page, None))
            .collect();
        if pages.is_empty() {
            return None;
        }

        let flags: Vec<bool> = pages
            .iter()
            .flat_map(|p| p.flatten())
            .filter_map(|p| p.complete)
            .collect();

        Some(HydratedGroup {
            name: group.name.to_string(),
            group_type: group.group_type,
            number_pages_and_subpages: flags.len(),
            number_complete: flags.iter().filter(|c| **c).count(),
            pages,
        })
    }
}

/// Hydrate `sitemap` for `current_url`.
///
/// When the context carries a case only case navigation groups are exposed.
pub fn hydrate(
    sitemap: &Sitemap,
    current_url: &str,
    context: &SitemapContext,
) -> AppResult<HydratedSitemap> {
    let (route_name, _) = routes::resolve(current_url)
        .ok_or_else(|| AppError::NotFound(format!("Page for URL {}", current_url)))?;
    let (template_group, template) = sitemap
        .find(route_name)
        .ok_or_else(|| AppError::NotFound(format!("Page {}", route_name)))?;

    let hydrator = Hydrator {
        context,
        current_url: normalise_url(current_url),
    };

    let groups: Vec<HydratedGroup> = sitemap
        .groups
        .iter()
        .filter(|g| !context.is_case_scoped() || g.group_type.is_case_scoped())
        .filter_map(|g| hydrator.group(g))
        .collect();

    let current_index = groups
        .iter()
        .position(|g| g.name == template_group.name && g.contains_current())
        .or_else(|| groups.iter().position(|g| g.contains_current()));

    let next_page_url = next_page_url(template.kind, context, &groups, current_index);

    Ok(HydratedSitemap {
        current_url: hydrator.current_url.clone(),
        current_page_name: substitute(
            template.name,
            context.current.as_ref(),
            context.case.as_ref(),
        ),
        current_group_name: current_index.map(|i| groups[i].name.clone()),
        groups,
        next_page_url,
    })
}

fn next_page_url(
    kind: PageKind,
    context: &SitemapContext,
    groups: &[HydratedGroup],
    current_index: Option<usize>,
) -> Option<String> {
    if kind == PageKind::CaseMetadata
        && let Some(case) = &context.case
    {
        return match &context.audit {
            Some(audit) => routes::reverse(
                "audits-edit-audit-metadata",
                &Kwargs::from([("pk".to_string(), audit.id)]),
            ),
            None => routes::reverse(
                "audits-audit-create",
                &Kwargs::from([("case_id".to_string(), case.id)]),
            ),
        };
    }

    let index = current_index?;
    let pages = groups[index].flatten();
    let position = pages.iter().position(|p| p.is_current)?;
    if let Some(next) = pages.get(position + 1) {
        return Some(next.url.clone());
    }

    groups[index + 1..]
        .iter()
        .find_map(|g| g.pages.first())
        .map(|p| p.url.clone())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::pages::platform_sitemap;
    use super::super::tree::{InstanceClass, PlatformPage as Page, PlatformPageGroup as Group};
    use super::*;

    fn bound(class: InstanceClass, id: i32, value: Value) -> BoundInstance {
        BoundInstance::new(class, id, &value).unwrap()
    }

    fn case_instance(has_audit: bool) -> BoundInstance {
        bound(
            InstanceClass::Case,
            1,
            json!({
                "id": 1,
                "organisation_name": "Acme Council",
                "previous_case_url": "",
                "case_details_complete_date": "2024-01-02",
                "has_no_audit": !has_audit,
                "has_no_contacts": true,
            }),
        )
    }

    fn audit_instance(complete: &[&str], uses_statement_checks: bool) -> BoundInstance {
        let mut value = json!({
            "id": 5,
            "case_id": 1,
            "uses_statement_checks": uses_statement_checks,
            "uses_legacy_statement": !uses_statement_checks,
        });
        for field in complete {
            value[*field] = json!("2024-02-01");
        }
        bound(InstanceClass::Audit, 5, value)
    }

    fn case_context(audit: Option<BoundInstance>) -> SitemapContext {
        SitemapContext {
            current: Some(case_instance(audit.is_some())),
            case: Some(case_instance(audit.is_some())),
            audit,
            ..Default::default()
        }
    }

    fn group<'a>(sitemap: &'a HydratedSitemap, name: &str) -> &'a HydratedGroup {
        sitemap.groups.iter().find(|g| g.name == name).unwrap()
    }

    #[test]
    fn test_initial_test_progress_counts_completable_pages() {
        let audit = audit_instance(
            &["audit_metadata_complete_date", "audit_pages_complete_date"],
            false,
        );
        let context = SitemapContext {
            current: Some(audit.clone()),
            ..case_context(Some(audit))
        };
        let hydrated = hydrate(
            &platform_sitemap(),
            "/audits/5/edit-audit-metadata/",
            &context,
        )
        .unwrap();

        let initial = group(&hydrated, "Initial WCAG test");
        assert_eq!(initial.number_pages_and_subpages, 4);
        assert_eq!(initial.number_complete, 2);
        assert_eq!(hydrated.current_group_name.as_deref(), Some("Initial WCAG test"));
        assert!(initial.pages.iter().all(|p| p.name != "Start test"));
    }

    #[test]
    fn test_show_flag_false_removes_page_from_both_counts() {
        let sitemap = Sitemap {
            groups: vec![Group::new(
                "Initial WCAG test",
                GroupType::CaseNav,
                vec![
                    Page::new("Metadata", "audits-edit-audit-metadata")
                        .instance(InstanceClass::Audit)
                        .complete("audit_metadata_complete_date"),
                    Page::new("Pages", "audits-edit-audit-pages")
                        .instance(InstanceClass::Audit)
                        .complete("audit_pages_complete_date"),
                    Page::new("Decision", "audits-edit-website-decision")
                        .instance(InstanceClass::Audit)
                        .complete("audit_website_decision_complete_date"),
                    Page::new("Summary", "audits-edit-audit-wcag-summary")
                        .instance(InstanceClass::Audit)
                        .complete("audit_wcag_summary_complete_date")
                        .show("show_summary"),
                ],
            )],
        };
        let complete = ["audit_metadata_complete_date", "audit_wcag_summary_complete_date"];

        let shown = audit_instance(&complete, true).with("show_summary", true);
        let hydrated = hydrate(
            &sitemap,
            "/audits/5/edit-audit-metadata/",
            &case_context(Some(shown)),
        )
        .unwrap();
        assert_eq!(hydrated.groups[0].number_pages_and_subpages, 4);
        assert_eq!(hydrated.groups[0].number_complete, 2);

        let hidden = audit_instance(&complete, true).with("show_summary", false);
        let hydrated = hydrate(
            &sitemap,
            "/audits/5/edit-audit-metadata/",
            &case_context(Some(hidden)),
        )
        .unwrap();
        assert_eq!(hydrated.groups[0].number_pages_and_subpages, 3);
        assert_eq!(hydrated.groups[0].number_complete, 1);
    }

    #[test]
    fn test_statement_pages_follow_statement_regime() {
        let sitemap = platform_sitemap();
        let url = "/audits/5/edit-audit-metadata/";

        let modern = hydrate(&sitemap, url, &case_context(Some(audit_instance(&[], true)))).unwrap();
        let legacy = hydrate(&sitemap, url, &case_context(Some(audit_instance(&[], false)))).unwrap();

        assert_eq!(group(&modern, "Initial statement").number_pages_and_subpages, 10);
        assert_eq!(group(&legacy, "Initial statement").number_pages_and_subpages, 4);
        assert_eq!(
            group(&legacy, "Initial statement").pages[0].name,
            "Accessibility statement Pt. 1"
        );
    }

    #[test]
    fn test_case_scoped_sitemap_hides_platform_groups() {
        let sitemap = platform_sitemap();
        let hydrated = hydrate(&sitemap, "/cases/1/edit-case-metadata/", &case_context(None)).unwrap();
        assert!(hydrated.groups.iter().all(|g| g.group_type.is_case_scoped()));
        assert!(hydrated.groups.iter().any(|g| g.name == "Case details"));

        let unscoped = hydrate(&sitemap, "/cases/", &SitemapContext::default()).unwrap();
        let names: Vec<_> = unscoped.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["New case", "Platform"]);
        assert_eq!(unscoped.current_group_name.as_deref(), Some("Platform"));
        assert_eq!(unscoped.next_page_url.as_deref(), Some("/notifications/tasks/"));
    }

    #[test]
    fn test_case_metadata_continues_to_test_or_test_creation() {
        let sitemap = platform_sitemap();
        let url = "/cases/1/edit-case-metadata/";

        let without = hydrate(&sitemap, url, &case_context(None)).unwrap();
        assert_eq!(without.next_page_url.as_deref(), Some("/cases/1/create-audit/"));

        let with = hydrate(&sitemap, url, &case_context(Some(audit_instance(&[], true)))).unwrap();
        assert_eq!(
            with.next_page_url.as_deref(),
            Some("/audits/5/edit-audit-metadata/")
        );
    }

    #[test]
    fn test_next_page_walks_subpages_then_next_group() {
        let sitemap = platform_sitemap();
        let mut context = case_context(Some(audit_instance(&[], false)));
        context.audit_pages = vec![
            bound(InstanceClass::Page, 11, json!({"id": 11, "page_title": "Home page", "complete_date": "2024-02-02"})),
            bound(InstanceClass::Page, 12, json!({"id": 12, "page_title": "Contact page", "complete_date": null})),
        ];

        let hydrated = hydrate(&sitemap, "/audits/5/edit-audit-pages/", &context).unwrap();
        assert_eq!(
            hydrated.next_page_url.as_deref(),
            Some("/pages/11/edit-audit-page-checks/")
        );
        let initial = group(&hydrated, "Initial WCAG test");
        let names: Vec<_> = initial.pages[1].subpages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Home page test", "Contact page test"]);
        assert_eq!(initial.number_pages_and_subpages, 6);
        assert_eq!(initial.number_complete, 1);

        let hydrated = hydrate(&sitemap, "/pages/12/edit-audit-page-checks/", &context).unwrap();
        assert_eq!(
            hydrated.next_page_url.as_deref(),
            Some("/audits/5/edit-website-decision/")
        );

        let hydrated = hydrate(&sitemap, "/audits/5/edit-audit-wcag-summary/", &context).unwrap();
        assert_eq!(
            hydrated.next_page_url.as_deref(),
            Some("/audits/5/edit-audit-statement-1/")
        );
    }

    #[test]
    fn test_only_when_current_pages_and_previous_case_link() {
        let sitemap = platform_sitemap();
        let contact = bound(InstanceClass::Contact, 8, json!({"id": 8, "name": "Ann"}));
        let mut context = case_context(None);
        context.contacts = vec![contact.clone()];

        let hydrated = hydrate(&sitemap, "/cases/1/manage-contact-details/", &context).unwrap();
        assert!(group(&hydrated, "Correspondence").pages[0].subpages.is_empty());
        assert!(hydrated.groups.iter().all(|g| g.name != "Previous case"));

        context.current = Some(contact);
        if let Some(case) = context.case.take() {
            context.case = Some(case.with("previous_case_url", "https://amp.example/cases/3/view/"));
        }
        let hydrated = hydrate(&sitemap, "/contacts/8/edit-contact/", &context).unwrap();
        let manage = &group(&hydrated, "Correspondence").pages[0];
        assert_eq!(manage.subpages[0].name, "Edit contact Ann");
        assert!(manage.subpages[0].is_current);
        assert_eq!(hydrated.current_page_name, "Edit contact Ann");
        assert_eq!(
            group(&hydrated, "Previous case").pages[0].url,
            "https://amp.example/cases/3/view/"
        );
    }

    #[test]
    fn test_substitute_fills_placeholders() {
        let page = bound(InstanceClass::Retest, 2, json!({"id": 2, "id_within_case": 3}));
        let case = case_instance(false);
        assert_eq!(
            substitute("Retest #{instance.id_within_case} for {case.organisation_name}", Some(&page), Some(&case)),
            "Retest #3 for Acme Council"
        );
        assert_eq!(substitute("{instance.missing}!", Some(&page), None), "!");
    }

    #[test]
    fn test_unknown_url_is_not_found() {
        assert!(matches!(
            hydrate(&platform_sitemap(), "/nowhere/", &SitemapContext::default()),
            Err(AppError::NotFound(_))
        ));
    }
}
