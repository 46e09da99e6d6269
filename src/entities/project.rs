//! Project entity - a fabrication job owned by a client

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::entity::{self, sql_enum, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

/// Project lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Ongoing,
    Completed,
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Ongoing => write!(f, "ONGOING"),
            ProjectStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ONGOING" => Ok(ProjectStatus::Ongoing),
            "COMPLETED" => Ok(ProjectStatus::Completed),
            _ => Err(format!(
                "Invalid project status: {}. Use ongoing or completed",
                s
            )),
        }
    }
}

sql_enum!(ProjectStatus);

/// A fabrication project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    /// Owning client (mandatory)
    pub client_id: EntityId,
    pub created: DateTime<Utc>,
}

impl Project {
    pub fn new(name: String, client_id: EntityId) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Prj),
            name,
            location: None,
            status: ProjectStatus::default(),
            client_id,
            created: Utc::now(),
        }
    }
}

impl Entity for Project {
    const PREFIX: EntityPrefix = EntityPrefix::Prj;
    const NAME: &'static str = "project";
    const TABLE: &'static str = "projects";
    const COLUMNS: &'static [&'static str] = &["name", "location", "status", "client_id", "created"];

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
            location: row.get("location")?,
            status: row.get("status")?,
            client_id: row.get("client_id")?,
            created: entity::get_stamp(row, "created")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            entity::text(&self.name),
            entity::opt_text(self.location.as_deref()),
            entity::text(&self.status.to_string()),
            entity::id(&self.client_id),
            entity::stamp(&self.created),
        ]
    }
}

/// A project with its client's name and the number of reports filed against it
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub client_name: Option<String>,
    pub report_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_status_from_str() {
        assert_eq!("ongoing".parse::<ProjectStatus>().unwrap(), ProjectStatus::Ongoing);
        assert_eq!("COMPLETED".parse::<ProjectStatus>().unwrap(), ProjectStatus::Completed);
        assert!("archived".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn test_values_match_columns() {
        let project = Project::new("Tank Farm".to_string(), EntityId::new(EntityPrefix::Clt));
        assert_eq!(project.to_values().len(), Project::COLUMNS.len());
    }
}
