//! Inspector entity - QC personnel who sign off inspections and reports

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::entity::{self, sql_enum, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectorStatus {
    #[default]
    Active,
    Inactive,
}

impl std::fmt::Display for InspectorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InspectorStatus::Active => write!(f, "ACTIVE"),
            InspectorStatus::Inactive => write!(f, "INACTIVE"),
        }
    }
}

impl std::str::FromStr for InspectorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(InspectorStatus::Active),
            "INACTIVE" => Ok(InspectorStatus::Inactive),
            _ => Err(format!(
                "Invalid inspector status: {}. Use active or inactive",
                s
            )),
        }
    }
}

sql_enum!(InspectorStatus);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspector {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role name (e.g., "QC Inspector", "Welding Inspector")
    #[serde(default)]
    pub role: String,
    /// Certification text (e.g., "CSWIP 3.1", "ASNT Level II")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification: Option<String>,
    #[serde(default)]
    pub status: InspectorStatus,
    pub created: DateTime<Utc>,
}

impl Inspector {
    pub fn new(name: String, role: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Qci),
            name,
            email: None,
            role,
            certification: None,
            status: InspectorStatus::default(),
            created: Utc::now(),
        }
    }
}

impl Entity for Inspector {
    const PREFIX: EntityPrefix = EntityPrefix::Qci;
    const NAME: &'static str = "inspector";
    const TABLE: &'static str = "inspectors";
    const COLUMNS: &'static [&'static str] =
        &["name", "email", "role", "certification", "status", "created"];
    const ORDER_BY: &'static str = "name COLLATE NOCASE";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> String {
        self.name.clone()
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            role: row.get("role")?,
            certification: row.get("certification")?,
            status: row.get("status")?,
            created: entity::get_stamp(row, "created")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            entity::text(&self.name),
            entity::opt_text(self.email.as_deref()),
            entity::text(&self.role),
            entity::opt_text(self.certification.as_deref()),
            entity::text(&self.status.to_string()),
            entity::stamp(&self.created),
        ]
    }
}
