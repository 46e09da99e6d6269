//! SQLite-backed entity store
//!
//! The store is the persistence boundary for every entity:
//! - Creates the schema on first open and tracks its version
//! - Generic CRUD over any [`Entity`]
//! - Maps short IDs (PREFIX@N) to full entity IDs
//! - Computes derived metrics (project counts, welder repair rates, ...)

mod queries;
mod schema;
mod shortid;

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Params};
use thiserror::Error;

use crate::core::entity::Entity;
use crate::core::identity::EntityId;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Errors opening the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database schema version {found} is newer than this qcd supports ({supported}). Upgrade qcd.")]
    NewerSchema { found: i32, supported: i32 },
}

/// The entity store backed by SQLite
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create the store at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        tracing::debug!(path = %path.display(), "opened store");
        Self::with_connection(conn)
    }

    /// Open a private in-memory store
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Raw connection access for ad-hoc queries
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside an immediate transaction, committing on `Ok` and
    /// rolling back on `Err`
    pub fn transaction<T, E>(&self, f: impl FnOnce(&Store) -> Result<T, E>) -> Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK;") {
                    tracing::error!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    fn select_sql<E: Entity>() -> String {
        format!("SELECT id, {} FROM {}", E::COLUMNS.join(", "), E::TABLE)
    }

    /// Fetch the full collection in the entity's default order
    pub fn all<E: Entity>(&self) -> rusqlite::Result<Vec<E>> {
        let sql = format!("{} ORDER BY {}", Self::select_sql::<E>(), E::ORDER_BY);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| E::from_row(row))?;
        rows.collect()
    }

    /// Fetch entities matching a WHERE clause, in the default order
    pub fn select<E: Entity, P: Params>(&self, filter: &str, params: P) -> rusqlite::Result<Vec<E>> {
        let sql = format!(
            "{} WHERE {} ORDER BY {}",
            Self::select_sql::<E>(),
            filter,
            E::ORDER_BY
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, |row| E::from_row(row))?;
        rows.collect()
    }

    /// Fetch a single entity by ID
    pub fn get<E: Entity>(&self, id: &EntityId) -> rusqlite::Result<Option<E>> {
        let sql = format!("{} WHERE id = ?1", Self::select_sql::<E>());
        self.conn
            .query_row(&sql, [id], |row| E::from_row(row))
            .optional()
    }

    /// Insert a new entity and assign its short ID
    pub fn insert<E: Entity>(&self, entity: &E) -> rusqlite::Result<String> {
        let placeholders: Vec<String> = (1..=E::COLUMNS.len() + 1)
            .map(|i| format!("?{}", i))
            .collect();
        let sql = format!(
            "INSERT INTO {} (id, {}) VALUES ({})",
            E::TABLE,
            E::COLUMNS.join(", "),
            placeholders.join(", ")
        );
        let values = std::iter::once(Value::Text(entity.id().to_string())).chain(entity.to_values());
        self.conn.execute(&sql, params_from_iter(values))?;
        let short_id = self.ensure_short_id(entity.id())?;
        tracing::debug!(id = %entity.id(), %short_id, table = E::TABLE, "inserted");
        Ok(short_id)
    }

    /// Overwrite every column of an existing entity. Returns false when the
    /// entity does not exist.
    pub fn update<E: Entity>(&self, entity: &E) -> rusqlite::Result<bool> {
        let assignments: Vec<String> = E::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{} = ?{}", col, i + 2))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?1",
            E::TABLE,
            assignments.join(", ")
        );
        let values = std::iter::once(Value::Text(entity.id().to_string())).chain(entity.to_values());
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        tracing::debug!(id = %entity.id(), table = E::TABLE, changed, "updated");
        Ok(changed > 0)
    }

    /// Hard-delete an entity. Returns false when the entity does not exist.
    pub fn delete<E: Entity>(&self, id: &EntityId) -> rusqlite::Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", E::TABLE);
        let changed = self.conn.execute(&sql, [id])?;
        tracing::debug!(%id, table = E::TABLE, changed, "deleted");
        Ok(changed > 0)
    }

    /// Count rows of an entity table
    pub fn count<E: Entity>(&self) -> rusqlite::Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", E::TABLE);
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Resolve a user-supplied reference to an entity ID of type `E`.
    ///
    /// Accepts short IDs (`MAT@3`, `@3`, `3`), full IDs, and unique
    /// case-insensitive prefixes of full IDs.
    pub fn resolve<E: Entity>(&self, reference: &str) -> rusqlite::Result<Option<EntityId>> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Ok(None);
        }

        if let Some(id) = self.resolve_short_id(E::PREFIX, reference)? {
            return Ok(Some(id));
        }

        let pattern = format!("{}%", reference.to_ascii_uppercase());
        let sql = format!("SELECT id FROM {} WHERE UPPER(id) LIKE ?1 LIMIT 2", E::TABLE);
        let mut stmt = self.conn.prepare(&sql)?;
        let matches: Vec<EntityId> = stmt
            .query_map([pattern], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;

        match matches.as_slice() {
            [only] => Ok(Some(only.clone())),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Client, Project};

    fn store() -> Store {
        Store::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_get_update_delete() {
        let store = store();
        let mut client = Client::new("Acme Fabrication".to_string());
        let short_id = store.insert(&client).unwrap();
        assert_eq!(short_id, "CLT@1");

        let loaded: Client = store.get(&client.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Acme Fabrication");

        client.email = Some("qa@acme.test".to_string());
        assert!(store.update(&client).unwrap());
        let loaded: Client = store.get(&client.id).unwrap().unwrap();
        assert_eq!(loaded.email.as_deref(), Some("qa@acme.test"));

        assert!(store.delete::<Client>(&client.id).unwrap());
        assert!(store.get::<Client>(&client.id).unwrap().is_none());
        assert!(!store.delete::<Client>(&client.id).unwrap());
    }

    #[test]
    fn test_resolve_references() {
        let store = store();
        let a = Client::new("A".to_string());
        let b = Client::new("B".to_string());
        store.insert(&a).unwrap();
        store.insert(&b).unwrap();

        assert_eq!(store.resolve::<Client>("CLT@2").unwrap(), Some(b.id.clone()));
        assert_eq!(store.resolve::<Client>("clt@1").unwrap(), Some(a.id.clone()));
        assert_eq!(store.resolve::<Client>("@1").unwrap(), Some(a.id.clone()));
        assert_eq!(store.resolve::<Client>("2").unwrap(), Some(b.id.clone()));
        assert_eq!(
            store.resolve::<Client>(&a.id.to_string()).unwrap(),
            Some(a.id.clone())
        );
        assert_eq!(store.resolve::<Client>("CLT@9").unwrap(), None);
        // "CLT-" is a prefix of both IDs
        assert_eq!(store.resolve::<Client>("CLT-").unwrap(), None);
        // A project short ID never resolves to a client
        assert_eq!(store.resolve::<Project>("CLT@1").unwrap(), None);
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let store = store();
        let client = Client::new("A".to_string());
        store.insert(&client).unwrap();
        let project = Project::new("Tank farm".to_string(), client.id.clone());
        store.insert(&project).unwrap();

        let err = store.delete::<Client>(&client.id).unwrap_err();
        assert_eq!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::ConstraintViolation)
        );
    }

    #[test]
    fn test_transaction_rolls_back() {
        let store = store();
        let result: Result<(), rusqlite::Error> = store.transaction(|s| {
            s.insert(&Client::new("A".to_string()))?;
            Err(rusqlite::Error::QueryReturnedNoRows)
        });
        assert!(result.is_err());
        assert_eq!(store.count::<Client>().unwrap(), 0);
    }
}
