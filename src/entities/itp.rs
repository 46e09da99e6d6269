//! ITP entities - Inspection Test Plans, their ordered stage items and evidence

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::entity::{self, sql_enum, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// ITP document status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItpStatus {
    #[default]
    Draft,
    Issued,
    Approved,
}

impl ItpStatus {
    pub fn all() -> &'static [ItpStatus] {
        &[ItpStatus::Draft, ItpStatus::Issued, ItpStatus::Approved]
    }
}

impl std::fmt::Display for ItpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItpStatus::Draft => write!(f, "DRAFT"),
            ItpStatus::Issued => write!(f, "ISSUED"),
            ItpStatus::Approved => write!(f, "APPROVED"),
        }
    }
}

impl std::str::FromStr for ItpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(ItpStatus::Draft),
            "ISSUED" => Ok(ItpStatus::Issued),
            "APPROVED" => Ok(ItpStatus::Approved),
            _ => Err(format!(
                "Invalid ITP status: {}. Use draft, issued, or approved",
                s
            )),
        }
    }
}

sql_enum!(ItpStatus);

/// Approval state of a single ITP stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Approval {
    #[default]
    Pending,
    Pass,
    Reject,
}

impl std::fmt::Display for Approval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Approval::Pending => write!(f, "PENDING"),
            Approval::Pass => write!(f, "PASS"),
            Approval::Reject => write!(f, "REJECT"),
        }
    }
}

impl std::str::FromStr for Approval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Approval::Pending),
            "PASS" => Ok(Approval::Pass),
            "REJECT" => Ok(Approval::Reject),
            _ => Err(format!(
                "Invalid approval: {}. Use pending, pass, or reject",
                s
            )),
        }
    }
}

sql_enum!(Approval);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itp {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub status: ItpStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<EntityId>,
    pub created: DateTime<Utc>,
}

impl Itp {
    pub fn new(title: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Itp),
            title,
            status: ItpStatus::default(),
            project_id: None,
            created: Utc::now(),
        }
    }
}

impl Entity for Itp {
    const PREFIX: EntityPrefix = EntityPrefix::Itp;
    const NAME: &'static str = "ITP";
    const TABLE: &'static str = "itps";
    const COLUMNS: &'static [&'static str] = &["title", "status", "project_id", "created"];

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            status: row.get("status")?,
            project_id: row.get("project_id")?,
            created: entity::get_stamp(row, "created")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            entity::text(&self.title),
            entity::text(&self.status.to_string()),
            entity::opt_id(self.project_id.as_ref()),
            entity::stamp(&self.created),
        ]
    }
}

/// One inspection stage of an ITP
///
/// Items are displayed in insertion order; `seq` is assigned by the store when
/// the item is appended and is never renumbered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItpItem {
    pub id: EntityId,
    pub itp_id: EntityId,
    #[serde(default)]
    pub seq: i64,
    pub stage: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hold_point: bool,
    #[serde(default)]
    pub witness_point: bool,
    #[serde(default)]
    pub surveillance: bool,
    #[serde(default)]
    pub approval: Approval,
    pub created: DateTime<Utc>,
}

impl ItpItem {
    pub fn new(itp_id: EntityId, stage: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Itm),
            itp_id,
            seq: 0,
            stage,
            description: String::new(),
            hold_point: false,
            witness_point: false,
            surveillance: false,
            approval: Approval::default(),
            created: Utc::now(),
        }
    }

    /// Compact H/W/S designation, e.g. "H W -"
    pub fn designation(&self) -> String {
        let mark = |on: bool, c: char| if on { c } else { '-' };
        format!(
            "{} {} {}",
            mark(self.hold_point, 'H'),
            mark(self.witness_point, 'W'),
            mark(self.surveillance, 'S')
        )
    }
}

impl Entity for ItpItem {
    const PREFIX: EntityPrefix = EntityPrefix::Itm;
    const NAME: &'static str = "ITP item";
    const TABLE: &'static str = "itp_items";
    const COLUMNS: &'static [&'static str] = &[
        "itp_id",
        "seq",
        "stage",
        "description",
        "hold_point",
        "witness_point",
        "surveillance",
        "approval",
        "created",
    ];
    const ORDER_BY: &'static str = "seq";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> String {
        self.stage.clone()
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            itp_id: row.get("itp_id")?,
            seq: row.get("seq")?,
            stage: row.get("stage")?,
            description: row.get("description")?,
            hold_point: row.get("hold_point")?,
            witness_point: row.get("witness_point")?,
            surveillance: row.get("surveillance")?,
            approval: row.get("approval")?,
            created: entity::get_stamp(row, "created")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            entity::id(&self.itp_id),
            entity::int(self.seq),
            entity::text(&self.stage),
            entity::text(&self.description),
            entity::flag(self.hold_point),
            entity::flag(self.witness_point),
            entity::flag(self.surveillance),
            entity::text(&self.approval.to_string()),
            entity::stamp(&self.created),
        ]
    }
}

/// A reference to an evidence file attached to an ITP or NCR
///
/// Only the reference is stored: path, size and SHA-256 digest at the time it
/// was attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itp_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ncr_id: Option<EntityId>,
    pub path: String,
    pub file_name: String,
    pub size_bytes: i64,
    pub sha256: String,
    pub created: DateTime<Utc>,
}

impl Entity for Evidence {
    const PREFIX: EntityPrefix = EntityPrefix::Evd;
    const NAME: &'static str = "evidence";
    const TABLE: &'static str = "evidence";
    const COLUMNS: &'static [&'static str] = &[
        "itp_id",
        "ncr_id",
        "path",
        "file_name",
        "size_bytes",
        "sha256",
        "created",
    ];
    const ORDER_BY: &'static str = "created";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> String {
        self.file_name.clone()
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            itp_id: row.get("itp_id")?,
            ncr_id: row.get("ncr_id")?,
            path: row.get("path")?,
            file_name: row.get("file_name")?,
            size_bytes: row.get("size_bytes")?,
            sha256: row.get("sha256")?,
            created: entity::get_stamp(row, "created")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            entity::opt_id(self.itp_id.as_ref()),
            entity::opt_id(self.ncr_id.as_ref()),
            entity::text(&self.path),
            entity::text(&self.file_name),
            entity::int(self.size_bytes),
            entity::text(&self.sha256),
            entity::stamp(&self.created),
        ]
    }
}

/// An ITP with its item and evidence counts
#[derive(Debug, Clone, Serialize)]
pub struct ItpSummary {
    #[serde(flatten)]
    pub itp: Itp,
    pub project_name: Option<String>,
    pub item_count: usize,
    pub hold_points: usize,
    pub evidence_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_itp_status_from_str() {
        assert_eq!("issued".parse::<ItpStatus>().unwrap(), ItpStatus::Issued);
        assert!("closed".parse::<ItpStatus>().is_err());
    }

    #[test]
    fn test_item_designation() {
        let mut item = ItpItem::new(EntityId::new(EntityPrefix::Itp), "Fit-up".to_string());
        assert_eq!(item.designation(), "- - -");
        item.hold_point = true;
        item.surveillance = true;
        assert_eq!(item.designation(), "H - S");
    }

    #[test]
    fn test_values_match_columns() {
        let item = ItpItem::new(EntityId::new(EntityPrefix::Itp), "Visual".to_string());
        assert_eq!(item.to_values().len(), ItpItem::COLUMNS.len());
        let itp = Itp::new("Tank T-101".to_string());
        assert_eq!(itp.to_values().len(), Itp::COLUMNS.len());
    }
}
