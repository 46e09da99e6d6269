//! Markdown rendering through an embedded tera template

use rust_embed::Embed;
use serde::Serialize;
use tera::{Context, Tera};

use crate::export::{ExportError, ReportDocument};

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const TEMPLATE: &str = "report.md.tera";

/// Cells with pipes escaped so they stay inside their column
#[derive(Serialize)]
struct MarkdownView<'a> {
    title: &'a str,
    meta: &'a [(String, String)],
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|").replace(['\n', '\r'], " ")
}

pub(crate) fn render(doc: &ReportDocument) -> Result<String, ExportError> {
    let template = EmbeddedTemplates::get(TEMPLATE)
        .ok_or_else(|| tera::Error::template_not_found(TEMPLATE))?;
    let source = String::from_utf8_lossy(template.data.as_ref()).to_string();

    let view = MarkdownView {
        title: &doc.title,
        meta: &doc.meta,
        columns: doc.columns.iter().map(|c| escape(c)).collect(),
        rows: doc
            .rows
            .iter()
            .map(|r| r.iter().map(|c| escape(c)).collect())
            .collect(),
    };
    let context = Context::from_serialize(&view)?;
    Ok(Tera::one_off(&source, &context, false)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_table() {
        let mut doc = ReportDocument::new("NCR List")
            .meta("Open", 1)
            .columns(&["Number", "Description"]);
        doc.row(vec!["NCR-2026-0001".to_string(), "Gap | too wide".to_string()]);

        let md = render(&doc).unwrap();
        assert!(md.starts_with("# NCR List"));
        assert!(md.contains("- **Open:** 1"));
        assert!(md.contains("| Number | Description |"));
        assert!(md.contains("| NCR-2026-0001 | Gap \\| too wide |"));
    }

    #[test]
    fn test_markdown_without_rows() {
        let doc = ReportDocument::new("Empty").columns(&["A"]);
        let md = render(&doc).unwrap();
        assert!(md.contains("_No records_"));
    }
}
