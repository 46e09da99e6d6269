//! Material entity - one line of a fabrication mark list
//!
//! Materials are kept flat: every attribute of the mark list row lives on the
//! record itself, which keeps spreadsheet import a one-to-one mapping.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::entity::{self, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// A material / mark list entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialFields {
    pub drawing_no: String,
    pub mark_no: String,
    pub mark_spec: String,
    pub material_spec: String,
    pub quantity: i64,
    /// Length in mm
    pub length: f64,
    /// Width in mm
    pub width: f64,
    /// Height / thickness in mm
    pub height: f64,
    /// Total weight in kg
    pub total_weight: f64,
    /// Total paintable area in m²
    pub total_area: f64,
    pub remark: String,
    pub paint_system: String,
    pub assembly_mark: String,
    pub heat_no: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<EntityId>,
    #[serde(flatten)]
    pub fields: MaterialFields,
    pub created: DateTime<Utc>,
}

impl Material {
    pub fn new(fields: MaterialFields) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Mat),
            project_id: None,
            fields,
            created: Utc::now(),
        }
    }
}

impl Entity for Material {
    const PREFIX: EntityPrefix = EntityPrefix::Mat;
    const NAME: &'static str = "material";
    const TABLE: &'static str = "materials";
    const COLUMNS: &'static [&'static str] = &[
        "project_id",
        "drawing_no",
        "mark_no",
        "mark_spec",
        "material_spec",
        "quantity",
        "length",
        "width",
        "height",
        "total_weight",
        "total_area",
        "remark",
        "paint_system",
        "assembly_mark",
        "heat_no",
        "created",
    ];
    const ORDER_BY: &'static str = "drawing_no, mark_no";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> String {
        if self.fields.drawing_no.is_empty() {
            self.fields.mark_no.clone()
        } else {
            format!("{} / {}", self.fields.drawing_no, self.fields.mark_no)
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            fields: MaterialFields {
                drawing_no: row.get("drawing_no")?,
                mark_no: row.get("mark_no")?,
                mark_spec: row.get("mark_spec")?,
                material_spec: row.get("material_spec")?,
                quantity: row.get("quantity")?,
                length: row.get("length")?,
                width: row.get("width")?,
                height: row.get("height")?,
                total_weight: row.get("total_weight")?,
                total_area: row.get("total_area")?,
                remark: row.get("remark")?,
                paint_system: row.get("paint_system")?,
                assembly_mark: row.get("assembly_mark")?,
                heat_no: row.get("heat_no")?,
            },
            created: entity::get_stamp(row, "created")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        let f = &self.fields;
        vec![
            entity::opt_id(self.project_id.as_ref()),
            entity::text(&f.drawing_no),
            entity::text(&f.mark_no),
            entity::text(&f.mark_spec),
            entity::text(&f.material_spec),
            entity::int(f.quantity),
            entity::real(f.length),
            entity::real(f.width),
            entity::real(f.height),
            entity::real(f.total_weight),
            entity::real(f.total_area),
            entity::text(&f.remark),
            entity::text(&f.paint_system),
            entity::text(&f.assembly_mark),
            entity::text(&f.heat_no),
            entity::stamp(&self.created),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_match_columns() {
        let material = Material::new(MaterialFields::default());
        assert_eq!(material.to_values().len(), Material::COLUMNS.len());
    }

    #[test]
    fn test_title_falls_back_to_mark() {
        let mut material = Material::new(MaterialFields {
            mark_no: "B-101".to_string(),
            ..Default::default()
        });
        assert_eq!(material.title(), "B-101");

        material.fields.drawing_no = "DWG-7".to_string();
        assert_eq!(material.title(), "DWG-7 / B-101");
    }
}
