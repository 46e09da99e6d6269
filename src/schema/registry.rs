//! Embedded JSON schemas for MDR payloads

use std::collections::HashMap;

use rust_embed::Embed;

use crate::entities::Discipline;

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

/// Registry of payload schemas, one per discipline
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<Discipline, String>,
}

impl SchemaRegistry {
    /// File name of the schema for a discipline
    pub fn file_name(discipline: Discipline) -> String {
        format!("mdr-{}.schema.json", discipline.as_str().to_lowercase())
    }

    /// Get the raw schema text for a discipline
    pub fn get(&self, discipline: Discipline) -> Option<&str> {
        self.schemas.get(&discipline).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        let mut schemas = HashMap::new();
        for discipline in Discipline::all() {
            let name = Self::file_name(*discipline);
            match EmbeddedSchemas::get(&name) {
                Some(file) => match std::str::from_utf8(file.data.as_ref()) {
                    Ok(text) => {
                        schemas.insert(*discipline, text.to_string());
                    }
                    Err(e) => tracing::warn!(schema = %name, error = %e, "embedded schema is not UTF-8"),
                },
                None => tracing::warn!(schema = %name, "no embedded schema"),
            }
        }
        Self { schemas }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_discipline_has_a_schema() {
        let registry = SchemaRegistry::default();
        assert_eq!(registry.len(), Discipline::all().len());
        let fitup = registry.get(Discipline::Fitup).unwrap();
        assert!(fitup.contains("\"bevel_angle\""));
    }
}
