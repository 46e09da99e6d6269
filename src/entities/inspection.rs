//! Inspection entity - the inspection event every NCR traces back to

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::entity::{self, sql_enum, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// Outcome of an inspection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InspectionResult {
    #[default]
    Pending,
    Pass,
    Fail,
}

impl std::fmt::Display for InspectionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InspectionResult::Pending => write!(f, "PENDING"),
            InspectionResult::Pass => write!(f, "PASS"),
            InspectionResult::Fail => write!(f, "FAIL"),
        }
    }
}

impl std::str::FromStr for InspectionResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(InspectionResult::Pending),
            "PASS" => Ok(InspectionResult::Pass),
            "FAIL" => Ok(InspectionResult::Fail),
            _ => Err(format!(
                "Invalid inspection result: {}. Use pending, pass, or fail",
                s
            )),
        }
    }
}

sql_enum!(InspectionResult);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    pub id: EntityId,
    pub project_id: EntityId,
    pub inspector_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<EntityId>,
    #[serde(default)]
    pub result: InspectionResult,
    pub inspected_on: NaiveDate,
    #[serde(default)]
    pub notes: String,
    pub created: DateTime<Utc>,
}

impl Inspection {
    pub fn new(project_id: EntityId, inspector_id: EntityId) -> Self {
        let created = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Ins),
            project_id,
            inspector_id,
            material_id: None,
            result: InspectionResult::default(),
            inspected_on: created.date_naive(),
            notes: String::new(),
            created,
        }
    }
}

impl Entity for Inspection {
    const PREFIX: EntityPrefix = EntityPrefix::Ins;
    const NAME: &'static str = "inspection";
    const TABLE: &'static str = "inspections";
    const COLUMNS: &'static [&'static str] = &[
        "project_id",
        "inspector_id",
        "material_id",
        "result",
        "inspected_on",
        "notes",
        "created",
    ];
    const ORDER_BY: &'static str = "inspected_on DESC, created DESC";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> String {
        format!("{} inspection {}", self.result, self.inspected_on)
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            inspector_id: row.get("inspector_id")?,
            material_id: row.get("material_id")?,
            result: row.get("result")?,
            inspected_on: entity::get_date(row, "inspected_on")?,
            notes: row.get("notes")?,
            created: entity::get_stamp(row, "created")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            entity::id(&self.project_id),
            entity::id(&self.inspector_id),
            entity::opt_id(self.material_id.as_ref()),
            entity::text(&self.result.to_string()),
            entity::date(&self.inspected_on),
            entity::text(&self.notes),
            entity::stamp(&self.created),
        ]
    }
}

/// An inspection with its project and inspector names resolved
#[derive(Debug, Clone, Serialize)]
pub struct InspectionSummary {
    #[serde(flatten)]
    pub inspection: Inspection,
    pub project_name: Option<String>,
    pub inspector_name: Option<String>,
    pub ncr_count: usize,
}
