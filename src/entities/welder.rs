//! Welder entity - a certified welder and derived performance metrics

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::entity::{self, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// Repair rate (percent) below which a welder is in good standing
pub const DEFAULT_REPAIR_RATE_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Welder {
    pub id: EntityId,
    pub name: String,
    /// Welder qualification / certification ID (stamp number)
    pub cert_id: String,
    /// Performance score, 0-100
    #[serde(default)]
    pub score: f64,
    pub created: DateTime<Utc>,
}

impl Welder {
    pub fn new(name: String, cert_id: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Wld),
            name,
            cert_id,
            score: 0.0,
            created: Utc::now(),
        }
    }
}

impl Entity for Welder {
    const PREFIX: EntityPrefix = EntityPrefix::Wld;
    const NAME: &'static str = "welder";
    const TABLE: &'static str = "welders";
    const COLUMNS: &'static [&'static str] = &["name", "cert_id", "score", "created"];
    const ORDER_BY: &'static str = "name COLLATE NOCASE";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> String {
        format!("{} ({})", self.name, self.cert_id)
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            cert_id: row.get("cert_id")?,
            score: row.get("score")?,
            created: entity::get_stamp(row, "created")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            entity::text(&self.name),
            entity::text(&self.cert_id),
            entity::real(self.score),
            entity::stamp(&self.created),
        ]
    }
}

/// Pass/fail styling derived from a welder's repair rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Pass,
    Fail,
}

impl Standing {
    /// Classify a repair rate (percent) against a threshold.
    ///
    /// Strictly below the threshold is a pass; the threshold itself fails.
    pub fn from_repair_rate(rate: f64, threshold: f64) -> Self {
        if rate < threshold {
            Standing::Pass
        } else {
            Standing::Fail
        }
    }
}

/// A welder with metrics computed from welding reports that name them
#[derive(Debug, Clone, Serialize)]
pub struct WelderSummary {
    #[serde(flatten)]
    pub welder: Welder,
    pub total_welds: usize,
    pub repairs: usize,
    /// Repairs as a percentage of total welds (0 when no welds)
    pub repair_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standing_threshold() {
        assert_eq!(Standing::from_repair_rate(3.0, 5.0), Standing::Pass);
        assert_eq!(Standing::from_repair_rate(8.0, 5.0), Standing::Fail);
        assert_eq!(Standing::from_repair_rate(5.0, 5.0), Standing::Fail);
        assert_eq!(Standing::from_repair_rate(0.0, 5.0), Standing::Pass);
    }

    #[test]
    fn test_values_match_columns() {
        let welder = Welder::new("A. Smith".to_string(), "W-042".to_string());
        assert_eq!(welder.to_values().len(), Welder::COLUMNS.len());
        assert_eq!(welder.title(), "A. Smith (W-042)");
    }
}
