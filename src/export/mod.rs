//! Report export: a format-neutral [`ReportDocument`] rendered to PDF or
//! Markdown
//!
//! Documents are built from the collection already loaded (and filtered) by
//! the caller, never from a fresh query.

pub mod layout;
mod markdown;
mod pdf;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

pub use layout::{layout, PageGeometry, PageLayout};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

/// Export target format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Pdf,
    Md,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Md => "md",
        }
    }
}

/// A titled document: metadata lines followed by one table
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportDocument {
    pub title: String,
    /// `label: value` lines under the title (counts, totals, record fields)
    pub meta: Vec<(String, String)>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn meta(mut self, label: impl Into<String>, value: impl ToString) -> Self {
        self.meta.push((label.into(), value.to_string()));
        self
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }
}

/// Lowercase slug of letters, digits and dashes
pub fn slug(text: &str) -> String {
    let mut out = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<Entity>_<slug>.<ext>` for a single record
pub fn record_file_name(entity: &str, label: &str, format: ExportFormat) -> String {
    format!("{}_{}.{}", entity, slug(label), format.extension())
}

/// `<report-kind>_<YYYYMMDD_HHMMSS>.<ext>` for a list
pub fn list_file_name(kind: &str, at: DateTime<Local>, format: ExportFormat) -> String {
    format!("{}_{}.{}", kind, at.format("%Y%m%d_%H%M%S"), format.extension())
}

/// Write `doc` into `dir` as `file_name`, returning the full path
pub fn write(
    doc: &ReportDocument,
    dir: &Path,
    file_name: &str,
    format: ExportFormat,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    match format {
        ExportFormat::Pdf => pdf::render(doc, &path)?,
        ExportFormat::Md => std::fs::write(&path, markdown::render(doc)?)?,
    }
    tracing::info!(path = %path.display(), rows = doc.rows.len(), "exported report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_file_names() {
        assert_eq!(
            record_file_name("NCR", "NCR-2026-0007", ExportFormat::Pdf),
            "NCR_ncr-2026-0007.pdf"
        );
        assert_eq!(
            record_file_name("ITP", "  Tank T-101 / Shell ", ExportFormat::Md),
            "ITP_tank-t-101-shell.md"
        );
        let at = Local.with_ymd_and_hms(2026, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            list_file_name("materials", at, ExportFormat::Pdf),
            "materials_20260309_140507.pdf"
        );
    }

    #[test]
    fn test_slug_of_symbols_only() {
        assert_eq!(slug("///"), "untitled");
    }

    #[test]
    fn test_write_pdf_and_markdown() {
        let dir = tempdir().unwrap();
        let mut doc = ReportDocument::new("Material List")
            .meta("Rows", 1)
            .columns(&["Mark", "Qty"]);
        doc.row(vec!["B1".to_string(), "4".to_string()]);

        let pdf = write(&doc, dir.path(), "materials.pdf", ExportFormat::Pdf).unwrap();
        let bytes = std::fs::read(&pdf).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let md = write(&doc, dir.path(), "materials.md", ExportFormat::Md).unwrap();
        let text = std::fs::read_to_string(md).unwrap();
        assert!(text.contains("# Material List"));
        assert!(text.contains("| B1 | 4 |"));
    }
}
