//! MDR entities - discipline-tagged Manufacturing Data Reports

mod payload;

pub use payload::{
    CuttingData, FieldError, FinalData, FitupData, IncomingData, MdrPayload, NdtData,
    PaintingData, WeldingData,
};

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::entity::{self, sql_enum, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// MDR discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Discipline {
    Cutting,
    Fitup,
    Ndt,
    Painting,
    Welding,
    Incoming,
    Final,
}

impl Discipline {
    pub fn all() -> &'static [Discipline] {
        &[
            Discipline::Cutting,
            Discipline::Fitup,
            Discipline::Ndt,
            Discipline::Painting,
            Discipline::Welding,
            Discipline::Incoming,
            Discipline::Final,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Discipline::Cutting => "CUTTING",
            Discipline::Fitup => "FITUP",
            Discipline::Ndt => "NDT",
            Discipline::Painting => "PAINTING",
            Discipline::Welding => "WELDING",
            Discipline::Incoming => "INCOMING",
            Discipline::Final => "FINAL",
        }
    }

    /// Display label, e.g. "Fit-up"
    pub fn label(&self) -> &'static str {
        match self {
            Discipline::Cutting => "Cutting",
            Discipline::Fitup => "Fit-up",
            Discipline::Ndt => "NDT",
            Discipline::Painting => "Painting",
            Discipline::Welding => "Welding",
            Discipline::Incoming => "Incoming",
            Discipline::Final => "Final",
        }
    }

    /// The statuses a report of this discipline may carry
    pub fn statuses(&self) -> &'static [ReportStatus] {
        match self {
            Discipline::Cutting | Discipline::Fitup | Discipline::Welding | Discipline::Incoming => {
                &[ReportStatus::Pass, ReportStatus::Reject, ReportStatus::Pending]
            }
            Discipline::Ndt => &[ReportStatus::Pass, ReportStatus::Fail, ReportStatus::Pending],
            Discipline::Painting | Discipline::Final => {
                &[ReportStatus::Pass, ReportStatus::Hold, ReportStatus::Pending]
            }
        }
    }

    pub fn allows(&self, status: ReportStatus) -> bool {
        self.statuses().contains(&status)
    }

    /// Status vocabulary as a display string, e.g. "PASS/FAIL/PENDING"
    pub fn vocabulary(&self) -> String {
        self.statuses()
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl std::fmt::Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Discipline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_uppercase().replace(['-', '_', ' '], "");
        Discipline::all()
            .iter()
            .copied()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid discipline: {}. Use cutting, fitup, ndt, painting, welding, incoming, or final",
                    s
                )
            })
    }
}

sql_enum!(Discipline);

/// Report status across all discipline vocabularies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportStatus {
    Pass,
    Reject,
    Fail,
    Hold,
    #[default]
    Pending,
}

/// How a status counts in statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    Open,
}

impl ReportStatus {
    pub fn outcome(&self) -> Outcome {
        match self {
            ReportStatus::Pass => Outcome::Passed,
            ReportStatus::Reject | ReportStatus::Fail => Outcome::Failed,
            ReportStatus::Hold | ReportStatus::Pending => Outcome::Open,
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Pass => write!(f, "PASS"),
            ReportStatus::Reject => write!(f, "REJECT"),
            ReportStatus::Fail => write!(f, "FAIL"),
            ReportStatus::Hold => write!(f, "HOLD"),
            ReportStatus::Pending => write!(f, "PENDING"),
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PASS" => Ok(ReportStatus::Pass),
            "REJECT" => Ok(ReportStatus::Reject),
            "FAIL" => Ok(ReportStatus::Fail),
            "HOLD" => Ok(ReportStatus::Hold),
            "PENDING" => Ok(ReportStatus::Pending),
            _ => Err(format!(
                "Invalid report status: {}. Use pass, reject, fail, hold, or pending",
                s
            )),
        }
    }
}

sql_enum!(ReportStatus);

/// Whether the stored payload decoded cleanly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integrity {
    #[default]
    Ok,
    Malformed,
}

/// A Manufacturing Data Report
#[derive(Debug, Clone, Serialize)]
pub struct MdrReport {
    pub id: EntityId,
    pub discipline: Discipline,
    pub project_id: EntityId,
    pub inspector_id: EntityId,
    pub status: ReportStatus,
    pub data: MdrPayload,
    pub integrity: Integrity,
    pub created: DateTime<Utc>,
    /// Undecodable `data` text, written back as-is until the payload is replaced
    #[serde(skip)]
    unreadable: Option<String>,
}

impl MdrReport {
    pub fn new(payload: MdrPayload, project_id: EntityId, inspector_id: EntityId) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Mdr),
            discipline: payload.discipline(),
            project_id,
            inspector_id,
            status: ReportStatus::Pending,
            data: payload,
            integrity: Integrity::Ok,
            created: Utc::now(),
            unreadable: None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        self.integrity == Integrity::Malformed
    }

    /// Replace the payload, discarding any unreadable stored text
    pub fn replace_payload(&mut self, payload: MdrPayload) {
        self.discipline = payload.discipline();
        self.data = payload;
        self.integrity = Integrity::Ok;
        self.unreadable = None;
    }
}

impl Entity for MdrReport {
    const PREFIX: EntityPrefix = EntityPrefix::Mdr;
    const NAME: &'static str = "MDR report";
    const TABLE: &'static str = "mdr_reports";
    const COLUMNS: &'static [&'static str] = &[
        "discipline",
        "project_id",
        "inspector_id",
        "status",
        "data",
        "created",
    ];

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> String {
        let headline = self.data.headline();
        if headline.is_empty() {
            format!("{} report", self.discipline.label())
        } else {
            format!("{} {}", self.discipline.label(), headline)
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let discipline: Discipline = row.get("discipline")?;
        let raw: Option<String> = row.get("data")?;
        let raw = raw.unwrap_or_default();
        let (data, integrity) = MdrPayload::decode(discipline, &raw);
        Ok(Self {
            id: row.get("id")?,
            discipline,
            project_id: row.get("project_id")?,
            inspector_id: row.get("inspector_id")?,
            status: row.get("status")?,
            data,
            integrity,
            created: entity::get_stamp(row, "created")?,
            unreadable: (integrity == Integrity::Malformed).then_some(raw),
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            entity::text(self.discipline.as_str()),
            entity::id(&self.project_id),
            entity::id(&self.inspector_id),
            entity::text(&self.status.to_string()),
            match &self.unreadable {
                Some(raw) => entity::text(raw),
                None => entity::text(&self.data.encode()),
            },
            entity::stamp(&self.created),
        ]
    }
}

/// A report with its project and inspector names resolved
#[derive(Debug, Clone, Serialize)]
pub struct MdrSummary {
    #[serde(flatten)]
    pub report: MdrReport,
    pub project_name: Option<String>,
    pub inspector_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discipline_from_str() {
        assert_eq!("fit-up".parse::<Discipline>().unwrap(), Discipline::Fitup);
        assert_eq!("NDT".parse::<Discipline>().unwrap(), Discipline::Ndt);
        assert!("hydrotest".parse::<Discipline>().is_err());
    }

    #[test]
    fn test_status_vocabularies() {
        assert!(Discipline::Ndt.allows(ReportStatus::Fail));
        assert!(!Discipline::Ndt.allows(ReportStatus::Reject));
        assert!(Discipline::Cutting.allows(ReportStatus::Reject));
        assert!(!Discipline::Cutting.allows(ReportStatus::Hold));
        assert!(Discipline::Painting.allows(ReportStatus::Hold));
        assert!(!Discipline::Final.allows(ReportStatus::Fail));
        assert_eq!(Discipline::Ndt.vocabulary(), "PASS/FAIL/PENDING");
        for discipline in Discipline::all() {
            assert!(discipline.allows(ReportStatus::Pass));
            assert!(discipline.allows(ReportStatus::Pending));
        }
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(ReportStatus::Reject.outcome(), Outcome::Failed);
        assert_eq!(ReportStatus::Fail.outcome(), Outcome::Failed);
        assert_eq!(ReportStatus::Hold.outcome(), Outcome::Open);
    }

    #[test]
    fn test_report_title() {
        let mut payload = MdrPayload::empty(Discipline::Fitup);
        let report = MdrReport::new(
            payload.clone(),
            EntityId::new(EntityPrefix::Prj),
            EntityId::new(EntityPrefix::Qci),
        );
        assert_eq!(report.title(), "Fit-up report");

        payload.set_field("joint_no", "J-12").unwrap();
        let report = MdrReport::new(
            payload,
            EntityId::new(EntityPrefix::Prj),
            EntityId::new(EntityPrefix::Qci),
        );
        assert_eq!(report.title(), "Fit-up J-12");
        assert_eq!(report.to_values().len(), MdrReport::COLUMNS.len());
    }
}
