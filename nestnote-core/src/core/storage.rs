use crate::{NestError, Result};
use rusqlite::Connection;
use std::path::Path;

const REQUIRED_TABLES: [&str; 5] = ["entries", "places", "routines", "categories", "nest_meta"];

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    /// In-memory database, mostly for tests and previews.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Validate database structure
        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type='table'
             AND name IN ('entries', 'places', 'routines', 'categories', 'nest_meta')",
            [],
            |row| row.get(0),
        )?;

        if table_count != REQUIRED_TABLES.len() as i64 {
            return Err(NestError::InvalidNest(
                "Not a valid Nest Note database".to_string(),
            ));
        }

        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn table_names(storage: &Storage) -> Vec<String> {
        storage
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_create_storage() {
        let temp = NamedTempFile::new().unwrap();
        let storage = Storage::create(temp.path()).unwrap();

        let tables = table_names(&storage);
        for table in REQUIRED_TABLES {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_open_existing_storage() {
        let temp = NamedTempFile::new().unwrap();
        Storage::create(temp.path()).unwrap();

        let storage = Storage::open(temp.path()).unwrap();
        assert_eq!(table_names(&storage).len(), REQUIRED_TABLES.len());
    }

    #[test]
    fn test_open_invalid_database() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "not a database").unwrap();

        assert!(Storage::open(temp.path()).is_err());
    }

    #[test]
    fn test_open_empty_database_is_rejected() {
        let temp = NamedTempFile::new().unwrap();
        Connection::open(temp.path()).unwrap();

        assert!(matches!(
            Storage::open(temp.path()),
            Err(NestError::InvalidNest(_))
        ));
    }

    #[test]
    fn test_open_leaves_schema_untouched() {
        let temp = NamedTempFile::new().unwrap();
        let schema = |storage: &Storage| -> Vec<String> {
            storage
                .connection()
                .prepare("SELECT sql FROM sqlite_master WHERE type='table' ORDER BY name")
                .unwrap()
                .query_map([], |row| row.get(0))
                .unwrap()
                .collect::<std::result::Result<_, _>>()
                .unwrap()
        };
        let created = schema(&Storage::create(temp.path()).unwrap());

        let opened = schema(&Storage::open(temp.path()).unwrap());
        assert_eq!(created, opened);
    }
}
