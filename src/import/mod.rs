//! Spreadsheet import of material (mark list) rows
//!
//! A file is read into a plain table of strings, headers are matched against
//! known aliases, and every row is mapped or reported. Nothing is written
//! here; the caller commits [`ImportPreview::into_fields`] once the preview
//! has no errors.

mod columns;

pub use columns::MaterialColumn;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use serde::Serialize;
use thiserror::Error;

use crate::entities::MaterialFields;

/// Rows shown before the user commits
pub const PREVIEW_ROWS: usize = 10;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Only .xlsx, .xls and .csv files can be imported (got {0})")]
    UnsupportedFormat(String),

    #[error("Could not read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("{0} contains no worksheet data")]
    Empty(PathBuf),

    #[error("No '{0}' column found; expected one of: {1}")]
    MissingColumn(&'static str, String),

    #[error("Import blocked: {0} row(s) have errors")]
    Blocked(usize),
}

/// Spreadsheet flavours we can read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Excel,
    Csv,
}

impl SheetFormat {
    /// Decide by extension, before touching the file
    pub fn detect(path: &Path) -> Result<Self, ImportError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xls" => Ok(SheetFormat::Excel),
            "csv" => Ok(SheetFormat::Csv),
            "" => Err(ImportError::UnsupportedFormat("a file without extension".to_string())),
            other => Err(ImportError::UnsupportedFormat(format!(".{}", other))),
        }
    }
}

/// Header row plus data rows, all as trimmed strings
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read the first worksheet (or the CSV file) into a [`RawTable`]
pub fn read_table(path: &Path) -> Result<RawTable, ImportError> {
    let read_err = |message: String| ImportError::Read {
        path: path.to_path_buf(),
        message,
    };

    let mut lines: Vec<Vec<String>> = match SheetFormat::detect(path)? {
        SheetFormat::Csv => {
            let file = File::open(path).map_err(|e| read_err(e.to_string()))?;
            let mut reader = ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .trim(csv::Trim::All)
                .from_reader(BufReader::new(file));
            reader
                .records()
                .map(|r| {
                    r.map(|record| record.iter().map(str::to_string).collect())
                        .map_err(|e| read_err(e.to_string()))
                })
                .collect::<Result<_, _>>()?
        }
        SheetFormat::Excel => {
            let mut workbook = open_workbook_auto(path).map_err(|e| read_err(e.to_string()))?;
            let range = workbook
                .worksheet_range_at(0)
                .ok_or_else(|| ImportError::Empty(path.to_path_buf()))?
                .map_err(|e| read_err(e.to_string()))?;
            range
                .rows()
                .map(|row| row.iter().map(cell_text).collect())
                .collect()
        }
    };

    // Leading blank lines are common above the header row
    while lines
        .first()
        .is_some_and(|l| l.iter().all(|c| c.trim().is_empty()))
    {
        lines.remove(0);
    }
    if lines.is_empty() {
        return Err(ImportError::Empty(path.to_path_buf()));
    }

    let headers = lines.remove(0);
    Ok(RawTable {
        headers,
        rows: lines,
    })
}

/// Render one worksheet cell as text
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// A problem with one spreadsheet row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// Spreadsheet row number, counting the header as row 1
    pub row: usize,
    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)
    }
}

/// Mapped rows and validation errors of one file
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportPreview {
    pub rows: Vec<MaterialFields>,
    pub errors: Vec<RowError>,
    /// Headers that matched no known column
    pub ignored_columns: Vec<String>,
}

impl ImportPreview {
    /// The first [`PREVIEW_ROWS`] mapped rows
    pub fn preview(&self) -> &[MaterialFields] {
        &self.rows[..self.rows.len().min(PREVIEW_ROWS)]
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Commit is only possible with rows and no errors
    pub fn can_commit(&self) -> bool {
        !self.has_errors() && !self.rows.is_empty()
    }

    /// The rows to create; refused while any error exists
    pub fn into_fields(self) -> Result<Vec<MaterialFields>, ImportError> {
        if self.has_errors() {
            return Err(ImportError::Blocked(self.errors.len()));
        }
        Ok(self.rows)
    }
}

/// Map a raw table onto material rows
pub fn map_rows(table: &RawTable) -> Result<ImportPreview, ImportError> {
    let mut columns: Vec<(usize, MaterialColumn)> = Vec::new();
    let mut ignored_columns = Vec::new();
    for (index, header) in table.headers.iter().enumerate() {
        match MaterialColumn::from_header(header) {
            // First matching column wins
            Some(column) if !columns.iter().any(|(_, c)| *c == column) => {
                columns.push((index, column))
            }
            Some(_) => ignored_columns.push(header.clone()),
            None if header.trim().is_empty() => {}
            None => ignored_columns.push(header.clone()),
        }
    }

    if !columns.iter().any(|(_, c)| *c == MaterialColumn::MarkNo) {
        return Err(ImportError::MissingColumn(
            "Mark No",
            MaterialColumn::MarkNo.aliases().join(", "),
        ));
    }

    let mut preview = ImportPreview {
        ignored_columns,
        ..ImportPreview::default()
    };

    for (i, cells) in table.rows.iter().enumerate() {
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let row = i + 2;
        let mut fields = MaterialFields::default();
        let mut row_errors = Vec::new();
        let mut saw_quantity = false;

        for (index, column) in &columns {
            let value = cells.get(*index).map(|c| c.trim()).unwrap_or("");
            if *column == MaterialColumn::Quantity {
                saw_quantity = !value.is_empty();
            }
            if let Err(message) = column.assign(&mut fields, value) {
                row_errors.push(RowError { row, message });
            }
        }

        if fields.mark_no.is_empty() {
            row_errors.push(RowError {
                row,
                message: "mark no is required".to_string(),
            });
        }
        if !saw_quantity {
            row_errors.push(RowError {
                row,
                message: "quantity is required".to_string(),
            });
        } else if fields.quantity <= 0 && row_errors.iter().all(|e| !e.message.starts_with("quantity")) {
            row_errors.push(RowError {
                row,
                message: format!("quantity must be greater than 0 (got {})", fields.quantity),
            });
        }

        if row_errors.is_empty() {
            preview.rows.push(fields);
        } else {
            preview.errors.extend(row_errors);
        }
    }

    tracing::debug!(
        rows = preview.rows.len(),
        errors = preview.errors.len(),
        "mapped import rows"
    );
    Ok(preview)
}

/// Read and map a spreadsheet
pub fn load(path: &Path) -> Result<ImportPreview, ImportError> {
    SheetFormat::detect(path)?;
    let table = read_table(path)?;
    map_rows(&table)
}

/// The canonical CSV header row
pub fn template_header() -> String {
    MaterialColumn::all()
        .iter()
        .map(|c| c.header())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let err = load(Path::new("marks.ods")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only .xlsx, .xls and .csv files can be imported (got .ods)"
        );
        assert_eq!(SheetFormat::detect(Path::new("A.XLSX")).unwrap(), SheetFormat::Excel);
    }

    #[test]
    fn test_header_aliases() {
        let t = table(
            &["Drawing No", "Mark No", "Qty", "Heat Number", "Weight (kg)", "Notes?"],
            &[&["D-100", "B1", "4", "H-77", "120.5", "x"]],
        );
        let preview = map_rows(&t).unwrap();
        assert!(preview.errors.is_empty());
        let row = &preview.rows[0];
        assert_eq!(row.drawing_no, "D-100");
        assert_eq!(row.heat_no, "H-77");
        assert_eq!(row.quantity, 4);
        assert_eq!(row.total_weight, 120.5);
        assert_eq!(preview.ignored_columns, vec!["Notes?".to_string()]);
    }

    #[test]
    fn test_row_errors_are_collected() {
        let t = table(
            &["mark_no", "quantity"],
            &[
                &["B1", "2"],
                &["", "3"],
                &["B3", "0"],
                &["B4", "-1"],
                &["B5", "many"],
                &["", ""],
                &["B6", "1"],
            ],
        );
        let preview = map_rows(&t).unwrap();
        assert_eq!(preview.rows.len(), 2);
        let rows: Vec<usize> = preview.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![3, 4, 5, 6]);
        assert_eq!(preview.errors[0].to_string(), "Row 3: mark no is required");
        assert!(!preview.can_commit());
        assert!(matches!(preview.into_fields(), Err(ImportError::Blocked(4))));
    }

    #[test]
    fn test_missing_mark_column() {
        let t = table(&["Drawing", "Qty"], &[&["D1", "1"]]);
        assert!(matches!(map_rows(&t), Err(ImportError::MissingColumn(..))));
    }

    #[test]
    fn test_preview_is_limited() {
        let rows: Vec<Vec<String>> = (0..25)
            .map(|i| vec![format!("M{}", i), "1".to_string()])
            .collect();
        let t = RawTable {
            headers: vec!["Mark".to_string(), "Qty".to_string()],
            rows,
        };
        let preview = map_rows(&t).unwrap();
        assert_eq!(preview.preview().len(), PREVIEW_ROWS);
        assert_eq!(preview.rows.len(), 25);
        assert!(preview.can_commit());
    }

    #[test]
    fn test_reads_csv_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("marks.csv");
        std::fs::write(
            &path,
            format!("{}\nD-1,B1,PL10,S355,2,1200,300,10,56.5,0.8,,EP-1,A1,H9\n", template_header()),
        )
        .unwrap();

        let preview = load(&path).unwrap();
        assert!(preview.errors.is_empty(), "{:?}", preview.errors);
        assert_eq!(preview.rows.len(), 1);
        assert_eq!(preview.rows[0].material_spec, "S355");
        assert_eq!(preview.rows[0].length, 1200.0);
        assert_eq!(preview.rows[0].paint_system, "EP-1");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(4.0)), "4");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::String(" B1 ".to_string())), "B1");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
