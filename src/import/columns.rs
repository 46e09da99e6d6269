//! Known material columns and their header aliases

use crate::entities::MaterialFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialColumn {
    DrawingNo,
    MarkNo,
    MarkSpec,
    MaterialSpec,
    Quantity,
    Length,
    Width,
    Height,
    TotalWeight,
    TotalArea,
    Remark,
    PaintSystem,
    AssemblyMark,
    HeatNo,
}

/// Lowercase, punctuation to spaces, whitespace collapsed
fn normalize(header: &str) -> String {
    header
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn number(name: &str, value: &str) -> Result<f64, String> {
    if value.is_empty() {
        return Ok(0.0);
    }
    match value.replace(',', ".").parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("{} '{}' is not a number", name, value)),
    }
}

fn whole_number(name: &str, value: &str) -> Result<i64, String> {
    if let Ok(v) = value.parse::<i64>() {
        return Ok(v);
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(format!("{} '{}' is not a whole number", name, value)),
    }
}

impl MaterialColumn {
    pub fn all() -> &'static [MaterialColumn] {
        &[
            MaterialColumn::DrawingNo,
            MaterialColumn::MarkNo,
            MaterialColumn::MarkSpec,
            MaterialColumn::MaterialSpec,
            MaterialColumn::Quantity,
            MaterialColumn::Length,
            MaterialColumn::Width,
            MaterialColumn::Height,
            MaterialColumn::TotalWeight,
            MaterialColumn::TotalArea,
            MaterialColumn::Remark,
            MaterialColumn::PaintSystem,
            MaterialColumn::AssemblyMark,
            MaterialColumn::HeatNo,
        ]
    }

    /// Canonical header, as written by the import template
    pub fn header(&self) -> &'static str {
        match self {
            MaterialColumn::DrawingNo => "Drawing No",
            MaterialColumn::MarkNo => "Mark No",
            MaterialColumn::MarkSpec => "Mark Spec",
            MaterialColumn::MaterialSpec => "Material Spec",
            MaterialColumn::Quantity => "Quantity",
            MaterialColumn::Length => "Length",
            MaterialColumn::Width => "Width",
            MaterialColumn::Height => "Height",
            MaterialColumn::TotalWeight => "Total Weight",
            MaterialColumn::TotalArea => "Total Area",
            MaterialColumn::Remark => "Remark",
            MaterialColumn::PaintSystem => "Paint System",
            MaterialColumn::AssemblyMark => "Assembly Mark",
            MaterialColumn::HeatNo => "Heat No",
        }
    }

    /// Accepted header spellings, already normalized
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            MaterialColumn::DrawingNo => &["drawing no", "drawing number", "drawing", "dwg no", "dwg"],
            MaterialColumn::MarkNo => &["mark no", "mark number", "mark", "piece mark", "part mark"],
            MaterialColumn::MarkSpec => &["mark spec", "mark specification", "profile", "section"],
            MaterialColumn::MaterialSpec => &["material spec", "material specification", "material", "grade"],
            MaterialColumn::Quantity => &["quantity", "qty", "pcs"],
            MaterialColumn::Length => &["length", "length mm", "l"],
            MaterialColumn::Width => &["width", "width mm", "w"],
            MaterialColumn::Height => &["height", "height mm", "thickness", "h"],
            MaterialColumn::TotalWeight => &["total weight", "total weight kg", "weight", "weight kg"],
            MaterialColumn::TotalArea => &["total area", "total area m2", "area", "area m2"],
            MaterialColumn::Remark => &["remark", "remarks", "comment", "comments"],
            MaterialColumn::PaintSystem => &["paint system", "paint", "coating system"],
            MaterialColumn::AssemblyMark => &["assembly mark", "assembly", "assy mark"],
            MaterialColumn::HeatNo => &["heat no", "heat number", "heat"],
        }
    }

    /// Match a header case-insensitively against every alias
    pub fn from_header(header: &str) -> Option<Self> {
        let normalized = normalize(header);
        if normalized.is_empty() {
            return None;
        }
        Self::all()
            .iter()
            .copied()
            .find(|c| c.aliases().contains(&normalized.as_str()))
    }

    /// Store one cell value; returns the row error message on failure
    pub fn assign(&self, fields: &mut MaterialFields, value: &str) -> Result<(), String> {
        let text = value.to_string();
        match self {
            MaterialColumn::DrawingNo => fields.drawing_no = text,
            MaterialColumn::MarkNo => fields.mark_no = text,
            MaterialColumn::MarkSpec => fields.mark_spec = text,
            MaterialColumn::MaterialSpec => fields.material_spec = text,
            MaterialColumn::Remark => fields.remark = text,
            MaterialColumn::PaintSystem => fields.paint_system = text,
            MaterialColumn::AssemblyMark => fields.assembly_mark = text,
            MaterialColumn::HeatNo => fields.heat_no = text,
            MaterialColumn::Quantity => {
                if !value.is_empty() {
                    fields.quantity = whole_number("quantity", value)?;
                }
            }
            MaterialColumn::Length => fields.length = number("length", value)?,
            MaterialColumn::Width => fields.width = number("width", value)?,
            MaterialColumn::Height => fields.height = number("height", value)?,
            MaterialColumn::TotalWeight => fields.total_weight = number("total weight", value)?,
            MaterialColumn::TotalArea => fields.total_area = number("total area", value)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heat_aliases() {
        for header in ["Heat Number", "Heat No", "heat", " HEAT_NO ", "Heat No."] {
            assert_eq!(
                MaterialColumn::from_header(header),
                Some(MaterialColumn::HeatNo),
                "{}",
                header
            );
        }
        assert_eq!(MaterialColumn::from_header("Heat treatment"), None);
    }

    #[test]
    fn test_every_canonical_header_maps_back() {
        for column in MaterialColumn::all() {
            assert_eq!(MaterialColumn::from_header(column.header()), Some(*column));
        }
    }

    #[test]
    fn test_quantity_parsing() {
        let mut fields = MaterialFields::default();
        MaterialColumn::Quantity.assign(&mut fields, "3.0").unwrap();
        assert_eq!(fields.quantity, 3);
        let err = MaterialColumn::Quantity.assign(&mut fields, "2.5").unwrap_err();
        assert_eq!(err, "quantity '2.5' is not a whole number");
    }
}
