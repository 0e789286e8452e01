//! Declarative description of the platform's workflow pages.

use serde::Serialize;
use utoipa::ToSchema;

/// How a group of pages is exposed in navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum GroupType {
    /// Stages of the current case.
    CaseNav,
    /// Link back to the case this one follows on from.
    PreviousCaseNav,
    /// Pages that start new case work.
    FutureCaseNav,
    /// Platform pages outside any case.
    Default,
}

impl GroupType {
    /// Groups shown while the current page belongs to a case.
    pub fn is_case_scoped(&self) -> bool {
        matches!(self, Self::CaseNav | Self::PreviousCaseNav)
    }
}

/// Entity a page edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InstanceClass {
    Case,
    Audit,
    Page,
    Contact,
    Retest,
    RetestPage,
    EqualityBodyCorrespondence,
}

/// Children a page enumerates into sub-pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSet {
    /// Testable pages of the audit.
    AuditPages,
    /// Pages with failed checks, for the 12-week retest.
    AuditRetestPages,
    Contacts,
    /// Equality-body retests, excluding the original-test row.
    Retests,
    RetestPages,
    EqualityBodyCorrespondence,
}

/// Behaviour attached to a page beyond the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Standard,
    /// Continues to the test metadata when a test exists, else to starting one.
    CaseMetadata,
    /// Links to the case's `previous_case_url`.
    PreviousCase,
    /// Repeats its single sub-page template for every child.
    Enumerate(ChildSet),
}

/// One page of the workflow.
///
/// `name` may refer to the bound instance as `{instance.field}` and to the
/// case as `{case.field}`.
#[derive(Debug, Clone)]
pub struct PlatformPage {
    pub name: &'static str,
    pub route_name: &'static str,
    pub instance_class: Option<InstanceClass>,
    pub url_kwarg_key: &'static str,
    pub complete_flag_name: Option<&'static str>,
    pub show_flag_name: Option<&'static str>,
    pub visible_only_when_current: bool,
    pub kind: PageKind,
    pub subpages: Vec<PlatformPage>,
}

impl PlatformPage {
    pub fn new(name: &'static str, route_name: &'static str) -> Self {
        Self {
            name,
            route_name,
            instance_class: None,
            url_kwarg_key: "pk",
            complete_flag_name: None,
            show_flag_name: None,
            visible_only_when_current: false,
            kind: PageKind::Standard,
            subpages: Vec::new(),
        }
    }

    pub fn instance(mut self, class: InstanceClass) -> Self {
        self.instance_class = Some(class);
        self
    }

    pub fn kwarg(mut self, key: &'static str) -> Self {
        self.url_kwarg_key = key;
        self
    }

    pub fn complete(mut self, flag: &'static str) -> Self {
        self.complete_flag_name = Some(flag);
        self
    }

    pub fn show(mut self, flag: &'static str) -> Self {
        self.show_flag_name = Some(flag);
        self
    }

    pub fn only_when_current(mut self) -> Self {
        self.visible_only_when_current = true;
        self
    }

    pub fn kind(mut self, kind: PageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Enumerate `children`, rendering each through `template`.
    pub fn enumerate(mut self, children: ChildSet, template: PlatformPage) -> Self {
        self.kind = PageKind::Enumerate(children);
        self.subpages = vec![template];
        self
    }

    pub fn subpages(mut self, subpages: Vec<PlatformPage>) -> Self {
        self.subpages = subpages;
        self
    }

    /// This page and every sub-page template, depth first.
    pub fn walk(&self) -> Vec<&PlatformPage> {
        let mut pages = vec![self];
        for subpage in &self.subpages {
            pages.extend(subpage.walk());
        }
        pages
    }
}

#[derive(Debug, Clone)]
pub struct PlatformPageGroup {
    pub name: &'static str,
    pub group_type: GroupType,
    pub pages: Vec<PlatformPage>,
}

impl PlatformPageGroup {
    pub fn new(name: &'static str, group_type: GroupType, pages: Vec<PlatformPage>) -> Self {
        Self {
            name,
            group_type,
            pages,
        }
    }

    pub fn find(&self, route_name: &str) -> Option<&PlatformPage> {
        self.pages
            .iter()
            .flat_map(|p| p.walk())
            .find(|p| p.route_name == route_name)
    }
}

/// The ordered groups of the platform.
#[derive(Debug, Clone)]
pub struct Sitemap {
    pub groups: Vec<PlatformPageGroup>,
}

impl Sitemap {
    /// Group and page bound to a route.
    ///
    /// Top-level pages win over sub-page templates sharing the route.
    pub fn find(&self, route_name: &str) -> Option<(&PlatformPageGroup, &PlatformPage)> {
        self.groups
            .iter()
            .find_map(|group| {
                group
                    .pages
                    .iter()
                    .find(|p| p.route_name == route_name)
                    .map(|page| (group, page))
            })
            .or_else(|| {
                self.groups
                    .iter()
                    .find_map(|group| group.find(route_name).map(|page| (group, page)))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_and_walk() {
        let page = PlatformPage::new("Pages", "audits-edit-audit-pages")
            .instance(InstanceClass::Audit)
            .complete("audit_pages_complete_date")
            .enumerate(
                ChildSet::AuditPages,
                PlatformPage::new("{instance.page_title} test", "audits-edit-audit-page-checks")
                    .instance(InstanceClass::Page)
                    .complete("complete_date"),
            );

        assert_eq!(page.url_kwarg_key, "pk");
        assert_eq!(page.kind, PageKind::Enumerate(ChildSet::AuditPages));
        assert_eq!(
            page.walk().iter().map(|p| p.route_name).collect::<Vec<_>>(),
            vec!["audits-edit-audit-pages", "audits-edit-audit-page-checks"]
        );
    }
}
