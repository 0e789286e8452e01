//! Derived identifiers: website domains, organisation slugs and report keys.

use reqwest::Url;

/// Domain of a home page URL, without any leading `www.`.
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Organisation name lower-cased with every non-alphanumeric replaced by `_`.
pub fn clean_org(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Blob store key of a published report.
pub fn report_key(
    case_id: i32,
    clean_org: &str,
    version: i32,
    report_version: &str,
    guid: &str,
) -> String {
    format!(
        "caseid_{}/org_{}__reportid_{}__reportversion_{}__guid_{}.html",
        case_id, clean_org, version, report_version, guid
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://acme.example"), Some("acme.example".into()));
        assert_eq!(
            extract_domain("https://www.Council.gov.uk/contact?x=1"),
            Some("council.gov.uk".into())
        );
        assert_eq!(extract_domain("not a url"), None);
        assert_eq!(extract_domain(""), None);
    }

    #[test]
    fn test_clean_org() {
        assert_eq!(clean_org("Acme Borough Council"), "acme_borough_council");
        assert_eq!(clean_org("St. Mary's (NHS)"), "st__mary_s__nhs_");
    }

    #[test]
    fn test_report_key() {
        assert_eq!(
            report_key(12, "acme", 2, "v1_1_0__20240401", "abc"),
            "caseid_12/org_acme__reportid_2__reportversion_v1_1_0__20240401__guid_abc.html"
        );
    }
}
