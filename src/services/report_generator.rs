//! Report generation: sections and tables materialised from a case and its
//! audit, plus HTML rendering of the result.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use pulldown_cmark::{Event, Options, Parser, html};
use sea_orm::*;
use serde::Serialize;
use tracing::info;

use crate::db::audits::load_audit_data;
use crate::db::cases::{find_audit_for_case, find_case};
use crate::db::catalogues::list_base_templates;
use crate::db::history::{record_create, record_update};
use crate::db::reports::{
    SectionWithRows, find_report_for_case, list_sections, list_visible_table_rows,
};
use crate::db::{self, DbPool};
use crate::entity::report::{self, Entity as Report};
use crate::entity::section::{self, Entity as Section};
use crate::entity::table_row::{self, Entity as TableRow};
use crate::entity::{base_template, case};
use crate::error::{AppError, AppResult};
use crate::models::report::SectionOverrideRequest;
use crate::models::{AuditData, EntityRef, REPORT_VERSION, TemplateType};
use crate::services::history::diff;

/// A table row produced by generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedRow {
    pub row_number: i32,
    pub cell_content_1: String,
    pub cell_content_2: String,
    pub cell_content_3: String,
}

/// A section produced by generation, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedSection {
    pub base_template_id: i32,
    pub name: String,
    pub template_type: TemplateType,
    pub position: i32,
    pub content: String,
    pub rows: Vec<GeneratedRow>,
}

#[derive(Serialize)]
struct PageContext {
    title: String,
    url: String,
    location: String,
}

fn template_context(case: &case::Model, data: &AuditData) -> AppResult<tera::Context> {
    let mut context = tera::Context::new();
    context.insert("case", case);
    context.insert("audit", &data.audit);
    context.insert(
        "pages",
        &data
            .testable_pages()
            .into_iter()
            .map(|p| PageContext {
                title: p.page_title(),
                url: p.url.clone(),
                location: p.location.clone(),
            })
            .collect::<Vec<_>>(),
    );
    context.insert("failed_check_count", &data.failed_check_results().len());
    context.insert(
        "statement_issues",
        &data
            .failed_statement_check_results()
            .into_iter()
            .map(|r| r.report_comment.clone())
            .collect::<Vec<_>>(),
    );
    Ok(context)
}

fn markdown_link(text: &str, url: &str) -> String {
    format!("[{}]({})", text.replace(['[', ']'], ""), url)
}

/// One row per testable page: title and a link to the page.
pub fn urls_table_rows(data: &AuditData) -> Vec<GeneratedRow> {
    data.testable_pages()
        .into_iter()
        .enumerate()
        .map(|(index, page)| GeneratedRow {
            row_number: index as i32 + 1,
            cell_content_1: page.page_title(),
            cell_content_2: markdown_link(&page.url, &page.url),
            cell_content_3: String::new(),
        })
        .collect()
}

/// One row per failed check, by page then WCAG order.
///
/// The first row for a WCAG definition carries its report boilerplate;
/// later rows for the same definition only name it.
pub fn issues_table_rows(data: &AuditData) -> Vec<GeneratedRow> {
    let mut seen = BTreeSet::new();
    data.failed_check_results()
        .into_iter()
        .enumerate()
        .map(|(index, result)| {
            let wcag = data.wcag_definition(result.wcag_definition_id);
            let name = wcag.map(|w| w.name.clone()).unwrap_or_default();
            let issue = match wcag {
                Some(w) if seen.insert(w.id) && !w.report_boilerplate.is_empty() => {
                    format!("{}\n\n{}", name, w.report_boilerplate)
                }
                _ => name,
            };
            let page = data
                .page(result.page_id)
                .map(|p| markdown_link(&p.page_title(), &p.url))
                .unwrap_or_default();
            GeneratedRow {
                row_number: index as i32 + 1,
                cell_content_1: issue,
                cell_content_2: page,
                cell_content_3: result.notes.clone(),
            }
        })
        .collect()
}

/// Build every section from the base templates in position order.
pub fn build_sections(
    templates: &[base_template::Model],
    case: &case::Model,
    data: &AuditData,
) -> AppResult<Vec<GeneratedSection>> {
    let context = template_context(case, data)?;
    let mut templates: Vec<&base_template::Model> = templates.iter().collect();
    templates.sort_by_key(|t| (t.position, t.id));

    templates
        .into_iter()
        .map(|template| {
            let content = tera::Tera::one_off(&template.content, &context, false)
                .map_err(|e| AppError::InvalidInput(format!(
                    "Failed to render report template '{}': {}",
                    template.name, e
                )))?;
            let rows = match template.template_type {
                TemplateType::UrlsTable => urls_table_rows(data),
                TemplateType::IssuesTable => issues_table_rows(data),
                TemplateType::Markdown | TemplateType::Html => Vec::new(),
            };
            Ok(GeneratedSection {
                base_template_id: template.id,
                name: template.name.clone(),
                template_type: template.template_type,
                position: template.position,
                content,
                rows,
            })
        })
        .collect()
}

/// Render markdown to HTML. Raw HTML in the source is escaped as text.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Inline markdown (a table cell) without the wrapping paragraph.
fn cell_html(markdown: &str) -> String {
    let rendered = markdown_to_html(markdown);
    let trimmed = rendered.trim();
    match trimmed
        .strip_prefix("<p>")
        .and_then(|s| s.strip_suffix("</p>"))
    {
        Some(inner) if !inner.contains("<p>") => inner.to_string(),
        _ => trimmed.to_string(),
    }
}

const REPORT_WRAPPER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Accessibility report for {{ organisation_name }}</title>
</head>
<body>
<header>
<h1>Accessibility report for {{ organisation_name }}</h1>
<p>Case {{ case_identifier }}{% if website_name %} | {{ website_name }}{% endif %}</p>
</header>
<main>
{{ body | safe }}
</main>
<footer>
{{ footer | safe }}
<p>Report version {{ report_version }}</p>
</footer>
</body>
</html>
"#;

/// Render the report HTML for the given sections.
pub fn render_html(
    case: &case::Model,
    report_version: &str,
    sections: &[SectionWithRows],
    footer_markdown: &str,
) -> AppResult<String> {
    let mut body = String::new();
    for SectionWithRows { section, rows } in sections {
        body.push_str(&format!(
            "<section id=\"section-{}\">\n<h2>{}</h2>\n",
            section.position,
            escape_html(&section.name)
        ));
        match section.template_type {
            TemplateType::Html => body.push_str(section.effective_content()),
            _ => body.push_str(&markdown_to_html(section.effective_content())),
        }
        if section.template_type.has_table() && !rows.is_empty() {
            body.push_str("<table>\n<tbody>\n");
            for row in rows {
                body.push_str("<tr>");
                for cell in [&row.cell_content_1, &row.cell_content_2, &row.cell_content_3] {
                    body.push_str(&format!("<td>{}</td>", cell_html(cell)));
                }
                body.push_str("</tr>\n");
            }
            body.push_str("</tbody>\n</table>\n");
        }
        body.push_str("</section>\n");
    }

    let mut context = tera::Context::new();
    context.insert("organisation_name", &case.organisation_name);
    context.insert("case_identifier", &case.case_identifier);
    context.insert("website_name", &case.website_name);
    context.insert("report_version", report_version);
    context.insert("body", &body);
    context.insert("footer", &markdown_to_html(footer_markdown));
    Ok(tera::Tera::one_off(REPORT_WRAPPER, &context, true)?)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Create the case's report, or return the existing one.
pub async fn create_report<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    case_id: i32,
) -> AppResult<report::Model> {
    if let Some(existing) = find_report_for_case(conn, case_id).await? {
        return Ok(existing);
    }
    let now = Utc::now();
    let report = report::ActiveModel {
        case_id: Set(case_id),
        version: Set(1),
        report_version: Set(REPORT_VERSION.to_string()),
        report_rebuilt: Set(None),
        created: Set(now),
        updated: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| AppError::Database(format!("Failed to create report: {}", e)))?;
    record_create(conn, EntityRef::Report(report.id), Some(case_id), Some(user_id), &report).await?;
    Ok(report)
}

/// Regenerate all sections of a case's report.
///
/// Section overrides survive regeneration when a template of the same name
/// still exists.
pub async fn generate_report(
    pool: &DbPool,
    user_id: i32,
    case_id: i32,
) -> AppResult<Vec<SectionWithRows>> {
    let txn = pool.begin().await?;
    let case = find_case(&txn, case_id).await?;
    let audit = find_audit_for_case(&txn, case_id)
        .await?
        .ok_or_else(|| AppError::field("audit", "Start the test before creating the report"))?;
    let data = load_audit_data(&txn, audit.id).await?;
    let report = create_report(&txn, user_id, case_id).await?;

    let templates = list_base_templates(&txn).await?;
    let generated = build_sections(&templates, &case, &data)?;

    let previous = list_sections(&txn, report.id).await?;
    let overrides: BTreeMap<String, String> = previous
        .iter()
        .filter_map(|s| s.content_override.clone().map(|o| (s.name.clone(), o)))
        .collect();
    let previous_ids: Vec<i32> = previous.iter().map(|s| s.id).collect();
    TableRow::delete_many()
        .filter(table_row::Column::SectionId.is_in(previous_ids.clone()))
        .exec(&txn)
        .await?;
    Section::delete_many()
        .filter(section::Column::Id.is_in(previous_ids))
        .exec(&txn)
        .await?;

    let now = Utc::now();
    let mut stored = Vec::with_capacity(generated.len());
    for generated_section in generated {
        let section = section::ActiveModel {
            report_id: Set(report.id),
            base_template_id: Set(Some(generated_section.base_template_id)),
            name: Set(generated_section.name.clone()),
            template_type: Set(generated_section.template_type),
            position: Set(generated_section.position),
            content: Set(generated_section.content),
            content_override: Set(overrides.get(&generated_section.name).cloned()),
            created: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to store section: {}", e)))?;

        let mut rows = Vec::with_capacity(generated_section.rows.len());
        for row in generated_section.rows {
            rows.push(
                table_row::ActiveModel {
                    section_id: Set(section.id),
                    row_number: Set(row.row_number),
                    cell_content_1: Set(row.cell_content_1),
                    cell_content_2: Set(row.cell_content_2),
                    cell_content_3: Set(row.cell_content_3),
                    is_deleted: Set(false),
                    ..Default::default()
                }
                .insert(&txn)
                .await?,
            );
        }
        stored.push(SectionWithRows { section, rows });
    }

    let rebuilt = report::Model {
        version: report.version + 1,
        report_rebuilt: Some(now),
        updated: now,
        ..report.clone()
    };
    let difference = diff(&report, &rebuilt)?;
    let mut active: report::ActiveModel = report.clone().into();
    active.version = Set(rebuilt.version);
    active.report_rebuilt = Set(rebuilt.report_rebuilt);
    active.updated = Set(now);
    Report::update(active).exec(&txn).await?;
    record_update(&txn, EntityRef::Report(report.id), Some(case_id), Some(user_id), difference)
        .await?;

    db::commit(txn).await?;
    info!(case_id, report_id = report.id, sections = stored.len(), "Report generated");
    Ok(stored)
}

/// Set or clear the content override of a section.
pub async fn set_section_override(
    pool: &DbPool,
    user_id: i32,
    section_id: i32,
    request: &SectionOverrideRequest,
) -> AppResult<section::Model> {
    let txn = pool.begin().await?;
    let current = Section::find_by_id(section_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Section {}", section_id)))?;
    let report = Report::find_by_id(current.report_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {}", current.report_id)))?;

    let edited = section::Model {
        content_override: request.content.clone(),
        ..current.clone()
    };
    let difference = diff(&current, &edited)?;
    if difference.is_empty() {
        return Ok(current);
    }

    let mut active: section::ActiveModel = current.into();
    active.content_override = Set(request.content.clone());
    let updated = active.update(&txn).await?;
    record_update(
        &txn,
        EntityRef::Section(section_id),
        Some(report.case_id),
        Some(user_id),
        difference,
    )
    .await?;
    db::commit(txn).await?;
    Ok(updated)
}

/// Soft-delete a table row and renumber the remaining visible rows densely.
pub async fn delete_table_row(pool: &DbPool, row_id: i32) -> AppResult<Vec<table_row::Model>> {
    let txn = pool.begin().await?;
    let row = TableRow::find_by_id(row_id)
        .filter(table_row::Column::IsDeleted.eq(false))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Table row {}", row_id)))?;
    let section_id = row.section_id;

    let mut active: table_row::ActiveModel = row.into();
    active.is_deleted = Set(true);
    active.update(&txn).await?;

    let mut renumbered = Vec::new();
    for (index, visible) in list_visible_table_rows(&txn, section_id)
        .await?
        .into_iter()
        .enumerate()
    {
        let row_number = index as i32 + 1;
        if visible.row_number == row_number {
            renumbered.push(visible);
            continue;
        }
        let mut active: table_row::ActiveModel = visible.into();
        active.row_number = Set(row_number);
        renumbered.push(active.update(&txn).await?);
    }

    db::commit(txn).await?;
    Ok(renumbered)
}

/// HTML of the current draft report.
pub async fn preview_html(pool: &DbPool, case_id: i32) -> AppResult<String> {
    let case = pool.get_case(case_id).await?;
    let report = pool.get_report_for_case(case_id).await?;
    let sections = pool.get_sections_with_rows(report.id).await?;
    let platform = pool.get_platform().await?;
    render_html(&case, &report.report_version, &sections, &platform.footer_links)
}
