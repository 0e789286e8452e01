//! Rendering of correspondence email templates against a case.

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::entity::{audit, case, contact, email_template, s3_report};
use crate::error::AppResult;
use crate::models::EmailTemplateType;
use crate::services::contacts::primary_contact;
use crate::services::report_generator::markdown_to_html;

/// A rendered email ready to be copied into the auditor's mail client.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenderedEmail {
    pub template_id: i32,
    pub subject: String,
    /// Markdown source after substitution.
    pub body: String,
    pub html: String,
}

/// Everything a template may refer to.
#[derive(Debug, Serialize)]
pub struct EmailContext<'a> {
    pub case: &'a case::Model,
    pub audit: Option<&'a audit::Model>,
    pub contact: Option<&'a contact::Model>,
    pub published_report_guid: Option<&'a str>,
    pub today: String,
}

/// Render a template's subject and body.
pub fn render_template(
    template: &email_template::Model,
    context: &EmailContext<'_>,
) -> AppResult<RenderedEmail> {
    let context = tera::Context::from_serialize(context)?;
    let subject = tera::Tera::one_off(&template.subject, &context, false)?;
    let body = tera::Tera::one_off(&template.content, &context, false)?;
    Ok(RenderedEmail {
        template_id: template.id,
        subject: subject.trim().to_string(),
        html: markdown_to_html(&body),
        body,
    })
}

pub async fn render_for_case(
    pool: &DbPool,
    template_id: i32,
    case_id: i32,
) -> AppResult<RenderedEmail> {
    let template = pool.get_email_template(template_id).await?;
    let case = pool.get_case(case_id).await?;
    let audit = pool.get_audit_for_case(case_id).await?;
    let contacts = pool.list_contacts(case_id).await?;
    let latest: Option<s3_report::Model> = pool.get_latest_published(case_id).await?;

    let context = EmailContext {
        case: &case,
        audit: audit.as_ref(),
        contact: primary_contact(&contacts),
        published_report_guid: latest.as_ref().map(|r| r.guid.as_str()),
        today: Utc::now().date_naive().format("%d/%m/%Y").to_string(),
    };
    render_template(&template, &context)
}

/// Templates offered today, optionally of one correspondence stage.
pub async fn list_current_templates(
    pool: &DbPool,
    template_type: Option<EmailTemplateType>,
) -> AppResult<Vec<email_template::Model>> {
    pool.list_email_templates(Some(Utc::now().date_naive()), template_type)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template_substitutes_case_fields() {
        let template = email_template::Model {
            id: 4,
            subject: "Accessibility report for {{ case.organisation_name }}".to_string(),
            content: "Dear {% if contact %}{{ contact.name }}{% else %}Sir or Madam{% endif %},\n\n\
                      Case **{{ case.case_identifier }}**."
                .to_string(),
            ..Default::default()
        };
        let case = case::Model {
            organisation_name: "Acme Council".to_string(),
            case_identifier: "#S-12".to_string(),
            ..Default::default()
        };
        let context = EmailContext {
            case: &case,
            audit: None,
            contact: None,
            published_report_guid: None,
            today: "01/03/2024".to_string(),
        };

        let rendered = render_template(&template, &context).unwrap();
        assert_eq!(rendered.subject, "Accessibility report for Acme Council");
        assert!(rendered.body.starts_with("Dear Sir or Madam,"));
        assert!(rendered.html.contains("<strong>#S-12</strong>"));
    }
}
