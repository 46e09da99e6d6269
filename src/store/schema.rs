//! Database schema initialization

use rusqlite::{params, OptionalExtension};

use super::{Store, StoreError, SCHEMA_VERSION};

impl Store {
    /// Create every table that does not exist yet and stamp the version
    pub(super) fn init_schema(&self) -> Result<(), StoreError> {
        let found: Option<i32> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
                [],
                |_| Ok(()),
            )
            .optional()?
            .map(|_| {
                self.conn
                    .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                        row.get::<_, Option<i32>>(0)
                    })
            })
            .transpose()?
            .flatten();

        if let Some(found) = found {
            if found > SCHEMA_VERSION {
                return Err(StoreError::NewerSchema {
                    found,
                    supported: SCHEMA_VERSION,
                });
            }
        }

        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Short ID mappings
            CREATE TABLE IF NOT EXISTS short_ids (
                short_id TEXT PRIMARY KEY,
                entity_id TEXT NOT NULL UNIQUE,
                prefix TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_short_ids_prefix ON short_ids(prefix);

            -- Next available short ID per prefix
            CREATE TABLE IF NOT EXISTS short_id_counters (
                prefix TEXT PRIMARY KEY,
                next_id INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS clients (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                contact TEXT,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                location TEXT,
                status TEXT NOT NULL,
                client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE RESTRICT,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_projects_client ON projects(client_id);

            CREATE TABLE IF NOT EXISTS materials (
                id TEXT PRIMARY KEY,
                project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
                drawing_no TEXT NOT NULL DEFAULT '',
                mark_no TEXT NOT NULL,
                mark_spec TEXT NOT NULL DEFAULT '',
                material_spec TEXT NOT NULL DEFAULT '',
                quantity INTEGER NOT NULL DEFAULT 0,
                length REAL NOT NULL DEFAULT 0,
                width REAL NOT NULL DEFAULT 0,
                height REAL NOT NULL DEFAULT 0,
                total_weight REAL NOT NULL DEFAULT 0,
                total_area REAL NOT NULL DEFAULT 0,
                remark TEXT NOT NULL DEFAULT '',
                paint_system TEXT NOT NULL DEFAULT '',
                assembly_mark TEXT NOT NULL DEFAULT '',
                heat_no TEXT NOT NULL DEFAULT '',
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_materials_project ON materials(project_id);

            CREATE TABLE IF NOT EXISTS welders (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                cert_id TEXT NOT NULL,
                score REAL NOT NULL DEFAULT 0,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS inspectors (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                role TEXT NOT NULL,
                certification TEXT,
                status TEXT NOT NULL,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS wps (
                id TEXT PRIMARY KEY,
                number TEXT NOT NULL UNIQUE,
                process TEXT NOT NULL,
                filler_metal TEXT NOT NULL DEFAULT '',
                position TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS drawings (
                id TEXT PRIMARY KEY,
                number TEXT NOT NULL,
                title TEXT NOT NULL,
                revision INTEGER NOT NULL DEFAULT 0,
                project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS itps (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                status TEXT NOT NULL,
                project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS itp_items (
                id TEXT PRIMARY KEY,
                itp_id TEXT NOT NULL REFERENCES itps(id) ON DELETE CASCADE,
                seq INTEGER NOT NULL,
                stage TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                hold_point INTEGER NOT NULL DEFAULT 0,
                witness_point INTEGER NOT NULL DEFAULT 0,
                surveillance INTEGER NOT NULL DEFAULT 0,
                approval TEXT NOT NULL,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_itp_items_itp ON itp_items(itp_id, seq);

            CREATE TABLE IF NOT EXISTS inspections (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE RESTRICT,
                inspector_id TEXT NOT NULL REFERENCES inspectors(id) ON DELETE RESTRICT,
                material_id TEXT REFERENCES materials(id) ON DELETE SET NULL,
                result TEXT NOT NULL,
                inspected_on TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_inspections_project ON inspections(project_id);

            CREATE TABLE IF NOT EXISTS ncrs (
                id TEXT PRIMARY KEY,
                ncr_number TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL,
                description TEXT NOT NULL,
                root_cause TEXT NOT NULL DEFAULT '',
                corrective_action TEXT NOT NULL DEFAULT '',
                inspection_id TEXT NOT NULL REFERENCES inspections(id) ON DELETE CASCADE,
                material_id TEXT REFERENCES materials(id) ON DELETE SET NULL,
                created TEXT NOT NULL,
                updated TEXT NOT NULL,
                closed_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_ncrs_inspection ON ncrs(inspection_id);

            CREATE TABLE IF NOT EXISTS evidence (
                id TEXT PRIMARY KEY,
                itp_id TEXT REFERENCES itps(id) ON DELETE CASCADE,
                ncr_id TEXT REFERENCES ncrs(id) ON DELETE CASCADE,
                path TEXT NOT NULL,
                file_name TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                sha256 TEXT NOT NULL,
                created TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS mdr_reports (
                id TEXT PRIMARY KEY,
                discipline TEXT NOT NULL,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE RESTRICT,
                inspector_id TEXT NOT NULL REFERENCES inspectors(id) ON DELETE RESTRICT,
                status TEXT NOT NULL,
                data TEXT,
                created TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_mdr_discipline ON mdr_reports(discipline);
            CREATE INDEX IF NOT EXISTS idx_mdr_project ON mdr_reports(project_id);
            "#,
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store.init_schema().unwrap();
        let version: i32 = store
            .conn()
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_refused() {
        let store = Store::open_in_memory().unwrap();
        store
            .conn()
            .execute("INSERT INTO schema_version (version) VALUES (99)", [])
            .unwrap();
        let err = store.init_schema().unwrap_err();
        assert!(matches!(err, StoreError::NewerSchema { found: 99, .. }));
    }
}
