//! Free-text search and the material filter
//!
//! A material is shown iff it matches the free text AND (there are no filter
//! rows OR at least one row matches). A row matches when every non-empty
//! field is a case-insensitive substring of the material's field.

use serde::{Deserialize, Serialize};

use crate::entities::MaterialFields;

/// Case-insensitive substring test; an empty needle matches everything
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// True when `text` is empty or found in any of `fields`
pub fn matches_any(fields: &[&str], text: &str) -> bool {
    text.trim().is_empty() || fields.iter().any(|f| contains_ci(f, text))
}

/// One structured filter row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRow {
    pub drawing_no: String,
    pub mark_no: String,
    pub material_spec: String,
    pub heat_no: String,
    pub assembly_mark: String,
    pub paint_system: String,
}

impl FilterRow {
    /// Parse `key=value[,key=value...]`
    pub fn parse(spec: &str) -> Result<Self, String> {
        let mut row = FilterRow::default();
        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("Invalid filter '{}'. Use key=value", pair))?;
            let value = value.trim().to_string();
            match key.trim().to_lowercase().as_str() {
                "drawing" | "drawing_no" | "dwg" => row.drawing_no = value,
                "mark" | "mark_no" => row.mark_no = value,
                "spec" | "material" | "material_spec" => row.material_spec = value,
                "heat" | "heat_no" => row.heat_no = value,
                "assembly" | "assembly_mark" => row.assembly_mark = value,
                "paint" | "paint_system" => row.paint_system = value,
                other => {
                    return Err(format!(
                        "Unknown filter field '{}'. Use drawing, mark, spec, heat, assembly, or paint",
                        other
                    ))
                }
            }
        }
        Ok(row)
    }

    pub fn is_empty(&self) -> bool {
        [
            &self.drawing_no,
            &self.mark_no,
            &self.material_spec,
            &self.heat_no,
            &self.assembly_mark,
            &self.paint_system,
        ]
        .iter()
        .all(|f| f.trim().is_empty())
    }

    /// Every non-empty field must match
    pub fn matches(&self, m: &MaterialFields) -> bool {
        contains_ci(&m.drawing_no, &self.drawing_no)
            && contains_ci(&m.mark_no, &self.mark_no)
            && contains_ci(&m.material_spec, &self.material_spec)
            && contains_ci(&m.heat_no, &self.heat_no)
            && contains_ci(&m.assembly_mark, &self.assembly_mark)
            && contains_ci(&m.paint_system, &self.paint_system)
    }
}

/// The material fields free-text search looks at
pub fn text_fields(m: &MaterialFields) -> [&str; 7] {
    [
        &m.drawing_no,
        &m.mark_no,
        &m.mark_spec,
        &m.material_spec,
        &m.heat_no,
        &m.assembly_mark,
        &m.remark,
    ]
}

/// OR-ed filter rows, combined with free text at match time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialFilter {
    pub rows: Vec<FilterRow>,
}

impl MaterialFilter {
    pub fn new(rows: Vec<FilterRow>) -> Self {
        Self { rows }
    }

    pub fn matches_rows(&self, m: &MaterialFields) -> bool {
        self.rows.is_empty() || self.rows.iter().any(|r| r.matches(m))
    }

    pub fn matches(&self, m: &MaterialFields, text: &str) -> bool {
        matches_any(&text_fields(m), text) && self.matches_rows(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(drawing: &str, mark: &str, heat: &str, remark: &str) -> MaterialFields {
        MaterialFields {
            drawing_no: drawing.to_string(),
            mark_no: mark.to_string(),
            heat_no: heat.to_string(),
            remark: remark.to_string(),
            material_spec: "S355JR".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = MaterialFilter::default();
        assert!(filter.matches(&material("D-1", "B1", "H1", ""), ""));
        assert!(filter.matches(&MaterialFields::default(), "  "));
    }

    #[test]
    fn test_text_is_case_insensitive_across_fields() {
        let filter = MaterialFilter::default();
        assert!(filter.matches(&material("D-1", "B1", "H1", "URGENT repaint"), "urgent"));
        assert!(!filter.matches(&material("D-1", "B1", "H1", ""), "urgent"));
        assert!(filter.matches(&material("D-1", "B1", "H1", ""), "s355"));
    }

    #[test]
    fn test_and_within_row_or_across_rows() {
        let rows = vec![
            FilterRow::parse("drawing=D-1,heat=H9").unwrap(),
            FilterRow::parse("mark=C").unwrap(),
        ];
        let filter = MaterialFilter::new(rows);

        // Row 1 needs both fields
        assert!(filter.matches_rows(&material("D-100", "B1", "H9", "")));
        assert!(!filter.matches_rows(&material("D-100", "B1", "H1", "")));
        // Row 2 alone
        assert!(filter.matches_rows(&material("X-2", "C7", "H1", "")));
        // Neither row
        assert!(!filter.matches_rows(&material("X-2", "B7", "H1", "")));
    }

    #[test]
    fn test_text_and_rows_are_conjunctive() {
        let filter = MaterialFilter::new(vec![FilterRow::parse("heat=H9").unwrap()]);
        assert!(filter.matches(&material("D-1", "B1", "H9", "needs primer"), "primer"));
        assert!(!filter.matches(&material("D-1", "B1", "H9", ""), "primer"));
        assert!(!filter.matches(&material("D-1", "B1", "H1", "needs primer"), "primer"));
    }

    #[test]
    fn test_row_with_only_blank_fields_matches_all() {
        let row = FilterRow {
            heat_no: "   ".to_string(),
            ..Default::default()
        };
        assert!(row.is_empty());
        assert!(row.matches(&material("D-1", "B1", "H1", "")));
    }

    #[test]
    fn test_parse_errors() {
        assert!(FilterRow::parse("heat").is_err());
        assert!(FilterRow::parse("colour=red").is_err());
        assert_eq!(
            FilterRow::parse(" Heat = h9 , ").unwrap().heat_no,
            "h9".to_string()
        );
    }
}
