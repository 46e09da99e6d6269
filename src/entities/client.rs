//! Client entity - the owner of one or more fabrication projects

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::entity::{self, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// A client (customer) of the fabrication shop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact person or phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub created: DateTime<Utc>,
}

impl Client {
    pub fn new(name: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Clt),
            name,
            email: None,
            contact: None,
            created: Utc::now(),
        }
    }
}

impl Entity for Client {
    const PREFIX: EntityPrefix = EntityPrefix::Clt;
    const NAME: &'static str = "client";
    const TABLE: &'static str = "clients";
    const COLUMNS: &'static [&'static str] = &["name", "email", "contact", "created"];
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
            contact: row.get("contact")?,
            created: entity::get_stamp(row, "created")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            entity::text(&self.name),
            entity::opt_text(self.email.as_deref()),
            entity::opt_text(self.contact.as_deref()),
            entity::stamp(&self.created),
        ]
    }
}

/// A client together with the number of projects it owns
#[derive(Debug, Clone, Serialize)]
pub struct ClientSummary {
    #[serde(flatten)]
    pub client: Client,
    pub project_count: usize,
}
