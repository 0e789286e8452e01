//! Loading report base templates from CSV.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::db::DbPool;
use crate::db::catalogues::BaseTemplateRow;
use crate::error::{AppError, AppResult};
use crate::models::TemplateType;

#[derive(Debug, Deserialize)]
struct CsvTemplate {
    name: String,
    template_type: String,
    position: i32,
    content: String,
}

/// Parse the templates CSV (`name,template_type,position,content`).
///
/// Every template body must parse, so generation cannot fail on a bad row.
pub fn parse_templates_csv(data: &str) -> AppResult<Vec<BaseTemplateRow>> {
    let mut reader = csv::Reader::from_reader(data.as_bytes());
    let mut rows: Vec<BaseTemplateRow> = Vec::new();

    for (index, record) in reader.deserialize::<CsvTemplate>().enumerate() {
        let record = record?;
        let line = index + 2;
        let template_type = TemplateType::parse(record.template_type.trim()).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Line {}: unknown template type '{}'",
                line, record.template_type
            ))
        })?;
        if record.name.trim().is_empty() {
            return Err(AppError::InvalidInput(format!("Line {}: template name is empty", line)));
        }
        if rows.iter().any(|r| r.name == record.name.trim()) {
            return Err(AppError::InvalidInput(format!(
                "Line {}: duplicate template '{}'",
                line, record.name
            )));
        }
        let mut tera = tera::Tera::default();
        tera.add_raw_template(&record.name, &record.content)
            .map_err(|e| AppError::InvalidInput(format!("Line {}: {}", line, e)))?;

        rows.push(BaseTemplateRow {
            name: record.name.trim().to_string(),
            template_type,
            position: record.position,
            content: record.content,
        });
    }

    rows.sort_by_key(|r| r.position);
    Ok(rows)
}

/// Load templates from a CSV file into the catalogue.
///
/// With `initial`, templates not in the file are removed.
pub async fn load_templates_file(pool: &DbPool, path: &Path, initial: bool) -> AppResult<(usize, usize)> {
    let data = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::InvalidInput(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let rows = parse_templates_csv(&data)?;
    let (created, updated) = pool.upsert_base_templates(&rows, initial).await?;
    info!(
        path = %path.display(),
        created,
        updated,
        initial,
        "Loaded report templates"
    );
    Ok((created, updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_templates_csv() {
        let data = "name,template_type,position,content\n\
                    Issues,issues-table,2,\"{{ failed_check_count }} issues, listed below\"\n\
                    Introduction,markdown,1,Report for {{ case.organisation_name }}\n";
        let rows = parse_templates_csv(data).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Introduction");
        assert_eq!(rows[1].template_type, TemplateType::IssuesTable);
        assert_eq!(rows[1].content, "{{ failed_check_count }} issues, listed below");
    }

    #[test]
    fn test_parse_templates_csv_rejects_bad_rows() {
        let unknown_type = "name,template_type,position,content\nIntro,pdf,1,Hello\n";
        assert!(matches!(parse_templates_csv(unknown_type), Err(AppError::InvalidInput(_))));

        let bad_template = "name,template_type,position,content\nIntro,markdown,1,{{ unclosed\n";
        assert!(parse_templates_csv(bad_template).is_err());

        let duplicate = "name,template_type,position,content\nA,markdown,1,x\nA,markdown,2,y\n";
        assert!(parse_templates_csv(duplicate).is_err());
    }
}
