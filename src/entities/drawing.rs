//! Drawing entity - a controlled fabrication drawing and its revision

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::entity::{self, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drawing {
    pub id: EntityId,
    pub number: String,
    pub title: String,
    /// Revision counter, starting at 0
    #[serde(default)]
    pub revision: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<EntityId>,
    pub created: DateTime<Utc>,
}

impl Drawing {
    pub fn new(number: String, title: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Dwg),
            number,
            title,
            revision: 0,
            project_id: None,
            created: Utc::now(),
        }
    }
}

impl Entity for Drawing {
    const PREFIX: EntityPrefix = EntityPrefix::Dwg;
    const NAME: &'static str = "drawing";
    const TABLE: &'static str = "drawings";
    const COLUMNS: &'static [&'static str] = &["number", "title", "revision", "project_id", "created"];
    const ORDER_BY: &'static str = "number";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> String {
        format!("{} rev {}", self.number, self.revision)
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            number: row.get("number")?,
            title: row.get("title")?,
            revision: row.get("revision")?,
            project_id: row.get("project_id")?,
            created: entity::get_stamp(row, "created")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            entity::text(&self.number),
            entity::text(&self.title),
            entity::int(self.revision as i64),
            entity::opt_id(self.project_id.as_ref()),
            entity::stamp(&self.created),
        ]
    }
}
