//! Named URL patterns of the workflow pages.
//!
//! Patterns use `{name}` placeholders for integer keyword arguments.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Keyword arguments captured from a URL.
pub type Kwargs = BTreeMap<String, i32>;

const ROUTE_PATTERNS: &[(&str, &str)] = &[
    ("cases-case-list", "/cases/"),
    ("cases-case-create", "/cases/create/"),
    ("notifications-task-list", "/notifications/tasks/"),
    ("common-wcag-definition-list", "/common/wcag-definitions/"),
    ("common-statement-check-list", "/common/statement-checks/"),
    ("common-email-template-list", "/common/email-templates/"),
    ("cases-case-detail", "/cases/{pk}/view/"),
    ("cases-edit-case-metadata", "/cases/{pk}/edit-case-metadata/"),
    ("cases-previous-case", "/cases/{pk}/previous-case/"),
    ("audits-audit-create", "/cases/{case_id}/create-audit/"),
    ("audits-edit-audit-metadata", "/audits/{pk}/edit-audit-metadata/"),
    ("audits-edit-audit-pages", "/audits/{pk}/edit-audit-pages/"),
    ("audits-edit-audit-page-checks", "/pages/{pk}/edit-audit-page-checks/"),
    ("audits-edit-website-decision", "/audits/{pk}/edit-website-decision/"),
    ("audits-edit-audit-wcag-summary", "/audits/{pk}/edit-audit-wcag-summary/"),
    ("audits-edit-statement-overview", "/audits/{pk}/edit-statement-overview/"),
    ("audits-edit-statement-website", "/audits/{pk}/edit-statement-website/"),
    ("audits-edit-statement-compliance", "/audits/{pk}/edit-statement-compliance/"),
    ("audits-edit-statement-non-accessible", "/audits/{pk}/edit-statement-non-accessible/"),
    ("audits-edit-statement-preparation", "/audits/{pk}/edit-statement-preparation/"),
    ("audits-edit-statement-feedback", "/audits/{pk}/edit-statement-feedback/"),
    ("audits-edit-statement-custom", "/audits/{pk}/edit-statement-custom/"),
    ("audits-edit-audit-statement-1", "/audits/{pk}/edit-audit-statement-1/"),
    ("audits-edit-audit-statement-2", "/audits/{pk}/edit-audit-statement-2/"),
    ("audits-edit-audit-disproportionate-burden", "/audits/{pk}/edit-audit-disproportionate-burden/"),
    ("audits-edit-statement-decision", "/audits/{pk}/edit-statement-decision/"),
    ("audits-edit-statement-summary", "/audits/{pk}/edit-statement-summary/"),
    ("cases-edit-report-ready-for-qa", "/cases/{pk}/edit-report-ready-for-qa/"),
    ("cases-edit-qa-auditor", "/cases/{pk}/edit-qa-auditor/"),
    ("cases-edit-qa-approval", "/cases/{pk}/edit-qa-approval/"),
    ("cases-edit-publish-report", "/cases/{pk}/edit-publish-report/"),
    ("cases-manage-contact-details", "/cases/{pk}/manage-contact-details/"),
    ("cases-edit-contact", "/contacts/{pk}/edit-contact/"),
    ("cases-edit-request-contact-details", "/cases/{pk}/edit-request-contact-details/"),
    ("cases-edit-one-week-contact-details", "/cases/{pk}/edit-one-week-contact-details/"),
    ("cases-edit-four-week-contact-details", "/cases/{pk}/edit-four-week-contact-details/"),
    ("cases-edit-report-sent-on", "/cases/{pk}/edit-report-sent-on/"),
    ("cases-edit-one-week-followup", "/cases/{pk}/edit-one-week-followup/"),
    ("cases-edit-four-week-followup", "/cases/{pk}/edit-four-week-followup/"),
    ("cases-edit-report-acknowledged", "/cases/{pk}/edit-report-acknowledged/"),
    ("cases-edit-12-week-update-requested", "/cases/{pk}/edit-12-week-update-requested/"),
    ("cases-edit-one-week-followup-final", "/cases/{pk}/edit-one-week-followup-final/"),
    ("cases-edit-12-week-update-acknowledged", "/cases/{pk}/edit-12-week-update-acknowledged/"),
    ("audits-edit-audit-retest-metadata", "/audits/{pk}/edit-audit-retest-metadata/"),
    ("audits-edit-audit-retest-pages", "/audits/{pk}/edit-audit-retest-pages/"),
    ("audits-edit-audit-retest-page-checks", "/pages/{pk}/edit-audit-retest-page-checks/"),
    ("audits-edit-audit-retest-website-decision", "/audits/{pk}/edit-audit-retest-website-decision/"),
    ("audits-edit-audit-retest-wcag-summary", "/audits/{pk}/edit-audit-retest-wcag-summary/"),
    ("audits-edit-retest-statement-overview", "/audits/{pk}/edit-retest-statement-overview/"),
    ("audits-edit-retest-statement-custom", "/audits/{pk}/edit-retest-statement-custom/"),
    ("audits-edit-retest-statement-decision", "/audits/{pk}/edit-retest-statement-decision/"),
    ("cases-edit-review-changes", "/cases/{pk}/edit-review-changes/"),
    ("cases-edit-enforcement-recommendation", "/cases/{pk}/edit-enforcement-recommendation/"),
    ("cases-edit-case-close", "/cases/{pk}/edit-case-close/"),
    ("cases-edit-equality-body-metadata", "/cases/{pk}/edit-equality-body-metadata/"),
    ("cases-list-equality-body-correspondence", "/cases/{pk}/list-equality-body-correspondence/"),
    ("cases-edit-equality-body-correspondence", "/correspondence/{pk}/edit/"),
    ("cases-retest-overview", "/cases/{pk}/retest-overview/"),
    ("retests-retest-metadata", "/retests/{pk}/retest-metadata/"),
    ("retests-retest-pages", "/retests/{pk}/retest-pages/"),
    ("retests-retest-page-checks", "/retest-pages/{pk}/retest-page-checks/"),
    ("retests-retest-compliance", "/retests/{pk}/retest-compliance/"),
    ("retests-retest-statement-decision", "/retests/{pk}/retest-statement-decision/"),
    ("retests-retest-comparison", "/retests/{pk}/retest-comparison/"),
    ("cases-deactivate-case", "/cases/{pk}/deactivate-case/"),
];

struct Route {
    name: &'static str,
    pattern: &'static str,
    regex: Regex,
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex is valid"));

static ROUTES: LazyLock<Vec<Route>> = LazyLock::new(|| {
    ROUTE_PATTERNS
        .iter()
        .map(|(name, pattern)| {
            let escaped = regex::escape(pattern).replace(r"\{", "{").replace(r"\}", "}");
            let source = PLACEHOLDER.replace_all(&escaped, r"(?P<$1>\d+)");
            Route {
                name,
                pattern,
                regex: Regex::new(&format!("^{}$", source)).expect("route patterns are valid"),
            }
        })
        .collect()
});

/// Route name and keyword arguments for a URL path.
///
/// Query strings and fragments are ignored, and a missing trailing slash is
/// tolerated.
pub fn resolve(url: &str) -> Option<(&'static str, Kwargs)> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let path = if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    };

    ROUTES.iter().find_map(|route| {
        let captures = route.regex.captures(&path)?;
        let kwargs = route
            .regex
            .capture_names()
            .flatten()
            .filter_map(|key| {
                let value = captures.name(key)?.as_str().parse().ok()?;
                Some((key.to_string(), value))
            })
            .collect();
        Some((route.name, kwargs))
    })
}

/// URL for a route, or `None` when the route is unknown or an argument is missing.
pub fn reverse(route_name: &str, kwargs: &Kwargs) -> Option<String> {
    let route = ROUTES.iter().find(|r| r.name == route_name)?;
    let mut missing = false;
    let url = PLACEHOLDER.replace_all(route.pattern, |caps: &regex::Captures| {
        match kwargs.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => {
                missing = true;
                String::new()
            }
        }
    });
    (!missing).then(|| url.into_owned())
}

pub fn is_known(route_name: &str) -> bool {
    ROUTES.iter().any(|r| r.name == route_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_extracts_kwargs() {
        let (name, kwargs) = resolve("/audits/12/edit-audit-metadata/").unwrap();
        assert_eq!(name, "audits-edit-audit-metadata");
        assert_eq!(kwargs.get("pk"), Some(&12));

        let (name, kwargs) = resolve("/cases/7/create-audit?from=nav").unwrap();
        assert_eq!(name, "audits-audit-create");
        assert_eq!(kwargs.get("case_id"), Some(&7));
    }

    #[test]
    fn test_resolve_rejects_unknown_and_non_numeric() {
        assert!(resolve("/cases/abc/view/").is_none());
        assert!(resolve("/nowhere/").is_none());
    }

    #[test]
    fn test_reverse_round_trips_through_resolve() {
        let kwargs = Kwargs::from([("pk".to_string(), 3)]);
        let url = reverse("retests-retest-pages", &kwargs).unwrap();
        assert_eq!(url, "/retests/3/retest-pages/");
        assert_eq!(resolve(&url).unwrap().0, "retests-retest-pages");
        assert!(reverse("retests-retest-pages", &Kwargs::new()).is_none());
        assert_eq!(reverse("cases-case-list", &Kwargs::new()).unwrap(), "/cases/");
    }
}
