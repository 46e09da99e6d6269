//! NCR entity - Non-Conformance Report

use chrono::{DateTime, Datelike, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::entity::{self, sql_enum, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// NCR workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NcrStatus {
    #[default]
    Open,
    OnProgress,
    Closed,
}

impl NcrStatus {
    pub fn all() -> &'static [NcrStatus] {
        &[NcrStatus::Open, NcrStatus::OnProgress, NcrStatus::Closed]
    }
}

impl std::fmt::Display for NcrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NcrStatus::Open => write!(f, "OPEN"),
            NcrStatus::OnProgress => write!(f, "ON_PROGRESS"),
            NcrStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

impl std::str::FromStr for NcrStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "OPEN" => Ok(NcrStatus::Open),
            "ON_PROGRESS" | "IN_PROGRESS" => Ok(NcrStatus::OnProgress),
            "CLOSED" => Ok(NcrStatus::Closed),
            _ => Err(format!(
                "Invalid NCR status: {}. Use open, on_progress, or closed",
                s
            )),
        }
    }
}

sql_enum!(NcrStatus);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ncr {
    pub id: EntityId,
    /// Human-readable unique number, e.g. "NCR-2026-0007"
    pub ncr_number: String,
    #[serde(default)]
    pub status: NcrStatus,
    pub description: String,
    #[serde(default)]
    pub root_cause: String,
    #[serde(default)]
    pub corrective_action: String,
    pub inspection_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<EntityId>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Ncr {
    pub fn new(ncr_number: String, description: String, inspection_id: EntityId) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Ncr),
            ncr_number,
            status: NcrStatus::default(),
            description,
            root_cause: String::new(),
            corrective_action: String::new(),
            inspection_id,
            material_id: None,
            created: now,
            updated: now,
            closed_at: None,
        }
    }

    /// Apply a status change, stamping or clearing `closed_at`
    pub fn set_status(&mut self, status: NcrStatus) {
        let now = Utc::now();
        match (self.status, status) {
            (NcrStatus::Closed, NcrStatus::Closed) => {}
            (_, NcrStatus::Closed) => self.closed_at = Some(now),
            _ => self.closed_at = None,
        }
        self.status = status;
        self.updated = now;
    }

    /// Days from creation to closure (or to now while still open)
    pub fn age_days(&self) -> i64 {
        let end = self.closed_at.unwrap_or_else(Utc::now);
        (end - self.created).num_days()
    }
}

/// Format the NCR number for the `seq`-th NCR raised in `year`
pub fn format_ncr_number(year: i32, seq: usize) -> String {
    format!("NCR-{}-{:04}", year, seq)
}

/// The number following the highest sequence used this year; `None` once
/// the sequence cannot grow
pub fn next_ncr_number(now: DateTime<Utc>, last_this_year: usize) -> Option<String> {
    let seq = last_this_year.checked_add(1)?;
    Some(format_ncr_number(now.year(), seq))
}

impl Entity for Ncr {
    const PREFIX: EntityPrefix = EntityPrefix::Ncr;
    const NAME: &'static str = "NCR";
    const TABLE: &'static str = "ncrs";
    const COLUMNS: &'static [&'static str] = &[
        "ncr_number",
        "status",
        "description",
        "root_cause",
        "corrective_action",
        "inspection_id",
        "material_id",
        "created",
        "updated",
        "closed_at",
    ];

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> String {
        self.ncr_number.clone()
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            ncr_number: row.get("ncr_number")?,
            status: row.get("status")?,
            description: row.get("description")?,
            root_cause: row.get("root_cause")?,
            corrective_action: row.get("corrective_action")?,
            inspection_id: row.get("inspection_id")?,
            material_id: row.get("material_id")?,
            created: entity::get_stamp(row, "created")?,
            updated: entity::get_stamp(row, "updated")?,
            closed_at: entity::get_opt_stamp(row, "closed_at")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            entity::text(&self.ncr_number),
            entity::text(&self.status.to_string()),
            entity::text(&self.description),
            entity::text(&self.root_cause),
            entity::text(&self.corrective_action),
            entity::id(&self.inspection_id),
            entity::opt_id(self.material_id.as_ref()),
            entity::stamp(&self.created),
            entity::stamp(&self.updated),
            entity::opt_stamp(self.closed_at.as_ref()),
        ]
    }
}

/// An NCR with the context of its backing inspection resolved
#[derive(Debug, Clone, Serialize)]
pub struct NcrSummary {
    #[serde(flatten)]
    pub ncr: Ncr,
    pub project_name: Option<String>,
    pub inspector_name: Option<String>,
    pub material_mark: Option<String>,
    pub evidence_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ncr_status_from_str() {
        assert_eq!("open".parse::<NcrStatus>().unwrap(), NcrStatus::Open);
        assert_eq!(
            "on-progress".parse::<NcrStatus>().unwrap(),
            NcrStatus::OnProgress
        );
        assert_eq!(NcrStatus::OnProgress.to_string(), "ON_PROGRESS");
        assert!("done".parse::<NcrStatus>().is_err());
    }

    #[test]
    fn test_ncr_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(next_ncr_number(now, 0).as_deref(), Some("NCR-2026-0001"));
        assert_eq!(next_ncr_number(now, 41).as_deref(), Some("NCR-2026-0042"));
        assert_eq!(next_ncr_number(now, usize::MAX), None);
    }

    #[test]
    fn test_closing_stamps_closed_at() {
        let mut ncr = Ncr::new(
            "NCR-2026-0001".to_string(),
            "Undercut".to_string(),
            EntityId::new(EntityPrefix::Ins),
        );
        assert!(ncr.closed_at.is_none());

        ncr.set_status(NcrStatus::Closed);
        let closed_at = ncr.closed_at.expect("closing stamps closed_at");

        ncr.set_status(NcrStatus::Closed);
        assert_eq!(ncr.closed_at, Some(closed_at));

        ncr.set_status(NcrStatus::OnProgress);
        assert!(ncr.closed_at.is_none());
    }
}
