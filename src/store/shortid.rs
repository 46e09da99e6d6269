//! Short ID mappings (PREFIX@N)
//!
//! Every inserted entity receives the next number for its prefix. Numbers are
//! never reused, so a short ID of a deleted entity simply stops resolving.

use rusqlite::{params, OptionalExtension};

use super::Store;
use crate::core::identity::{EntityId, EntityPrefix};

impl Store {
    /// Get or assign the short ID for an entity
    pub fn ensure_short_id(&self, id: &EntityId) -> rusqlite::Result<String> {
        if let Some(existing) = self.short_id(id)? {
            return Ok(existing);
        }

        let prefix = id.prefix().as_str();
        let next_id: i64 = self
            .conn
            .query_row(
                "SELECT next_id FROM short_id_counters WHERE prefix = ?1",
                params![prefix],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(1);

        let short_id = format!("{}@{}", prefix, next_id);

        self.conn.execute(
            "INSERT INTO short_ids (short_id, entity_id, prefix) VALUES (?1, ?2, ?3)",
            params![short_id, id, prefix],
        )?;
        self.conn.execute(
            "INSERT OR REPLACE INTO short_id_counters (prefix, next_id) VALUES (?1, ?2)",
            params![prefix, next_id + 1],
        )?;

        Ok(short_id)
    }

    /// Look up the short ID of an entity
    pub fn short_id(&self, id: &EntityId) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT short_id FROM short_ids WHERE entity_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
    }

    /// Short ID or, when none was assigned, the full ID
    pub fn display_id(&self, id: &EntityId) -> rusqlite::Result<String> {
        Ok(self.short_id(id)?.unwrap_or_else(|| id.to_string()))
    }

    /// Resolve `PREFIX@N`, `@N` or `N` for the expected prefix
    pub(super) fn resolve_short_id(
        &self,
        expected: EntityPrefix,
        reference: &str,
    ) -> rusqlite::Result<Option<EntityId>> {
        let (prefix, number) = match reference.split_once('@') {
            Some(("", num)) => (expected.as_str().to_string(), num),
            Some((prefix, num)) => (prefix.to_ascii_uppercase(), num),
            None if !reference.is_empty() && reference.chars().all(|c| c.is_ascii_digit()) => {
                (expected.as_str().to_string(), reference)
            }
            None => return Ok(None),
        };

        if prefix != expected.as_str() {
            return Ok(None);
        }
        let Ok(number) = number.parse::<u32>() else {
            return Ok(None);
        };

        self.conn
            .query_row(
                "SELECT entity_id FROM short_ids WHERE short_id = ?1",
                params![format!("{}@{}", prefix, number)],
                |row| row.get(0),
            )
            .optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Welder;

    #[test]
    fn test_short_ids_are_sequential_per_prefix() {
        let store = Store::open_in_memory().unwrap();
        let a = EntityId::new(EntityPrefix::Wld);
        let b = EntityId::new(EntityPrefix::Wld);
        let c = EntityId::new(EntityPrefix::Ncr);

        assert_eq!(store.ensure_short_id(&a).unwrap(), "WLD@1");
        assert_eq!(store.ensure_short_id(&b).unwrap(), "WLD@2");
        assert_eq!(store.ensure_short_id(&c).unwrap(), "NCR@1");
        assert_eq!(store.ensure_short_id(&a).unwrap(), "WLD@1");
    }

    #[test]
    fn test_numbers_not_reused_after_delete() {
        let store = Store::open_in_memory().unwrap();
        let first = Welder::new("A".to_string(), "W1".to_string());
        store.insert(&first).unwrap();
        store.delete::<Welder>(&first.id).unwrap();

        let second = Welder::new("B".to_string(), "W2".to_string());
        assert_eq!(store.insert(&second).unwrap(), "WLD@2");
    }

    #[test]
    fn test_display_id_falls_back_to_full_id() {
        let store = Store::open_in_memory().unwrap();
        let id = EntityId::new(EntityPrefix::Mat);
        assert_eq!(store.display_id(&id).unwrap(), id.to_string());
    }
}
