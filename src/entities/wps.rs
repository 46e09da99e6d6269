//! WPS entity - Welding Procedure Specification

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::entity::{self, sql_enum, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// Welding process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WeldProcess {
    /// Shielded metal arc (stick)
    #[default]
    Smaw,
    /// Gas tungsten arc (TIG)
    Gtaw,
    /// Flux-cored arc
    Fcaw,
    /// Submerged arc
    Saw,
}

impl std::fmt::Display for WeldProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeldProcess::Smaw => write!(f, "SMAW"),
            WeldProcess::Gtaw => write!(f, "GTAW"),
            WeldProcess::Fcaw => write!(f, "FCAW"),
            WeldProcess::Saw => write!(f, "SAW"),
        }
    }
}

impl std::str::FromStr for WeldProcess {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMAW" => Ok(WeldProcess::Smaw),
            "GTAW" => Ok(WeldProcess::Gtaw),
            "FCAW" => Ok(WeldProcess::Fcaw),
            "SAW" => Ok(WeldProcess::Saw),
            _ => Err(format!(
                "Invalid welding process: {}. Use SMAW, GTAW, FCAW, or SAW",
                s
            )),
        }
    }
}

sql_enum!(WeldProcess);

/// WPS approval status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WpsStatus {
    #[default]
    Pending,
    Approved,
}

impl std::fmt::Display for WpsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WpsStatus::Pending => write!(f, "PENDING"),
            WpsStatus::Approved => write!(f, "APPROVED"),
        }
    }
}

impl std::str::FromStr for WpsStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(WpsStatus::Pending),
            "APPROVED" => Ok(WpsStatus::Approved),
            _ => Err(format!("Invalid WPS status: {}. Use pending or approved", s)),
        }
    }
}

sql_enum!(WpsStatus);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wps {
    pub id: EntityId,
    /// WPS number (e.g., "WPS-CS-001")
    pub number: String,
    #[serde(default)]
    pub process: WeldProcess,
    /// Filler metal classification (e.g., "E7018")
    #[serde(default)]
    pub filler_metal: String,
    /// Qualified positions (e.g., "1G-6G")
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub status: WpsStatus,
    pub created: DateTime<Utc>,
}

impl Wps {
    pub fn new(number: String, process: WeldProcess) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Wps),
            number,
            process,
            filler_metal: String::new(),
            position: String::new(),
            status: WpsStatus::default(),
            created: Utc::now(),
        }
    }
}

impl Entity for Wps {
    const PREFIX: EntityPrefix = EntityPrefix::Wps;
    const NAME: &'static str = "WPS";
    const TABLE: &'static str = "wps";
    const COLUMNS: &'static [&'static str] =
        &["number", "process", "filler_metal", "position", "status", "created"];
    const ORDER_BY: &'static str = "number";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> String {
        self.number.clone()
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            number: row.get("number")?,
            process: row.get("process")?,
            filler_metal: row.get("filler_metal")?,
            position: row.get("position")?,
            status: row.get("status")?,
            created: entity::get_stamp(row, "created")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            entity::text(&self.number),
            entity::text(&self.process.to_string()),
            entity::text(&self.filler_metal),
            entity::text(&self.position),
            entity::text(&self.status.to_string()),
            entity::stamp(&self.created),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weld_process_from_str() {
        assert_eq!("gtaw".parse::<WeldProcess>().unwrap(), WeldProcess::Gtaw);
        assert_eq!("SAW".parse::<WeldProcess>().unwrap(), WeldProcess::Saw);
        assert!("mig".parse::<WeldProcess>().is_err());
    }
}
