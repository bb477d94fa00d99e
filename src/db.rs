use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub playlist_id: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct CacheRow {
    pub items_json: String,
    pub stored_at: String,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS playlist_cache (
                playlist_id TEXT PRIMARY KEY,
                items_json TEXT NOT NULL,
                stored_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS playlist_registry (
                playlist_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                added_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn cache_row(&self, playlist_id: &str) -> Result<Option<CacheRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT items_json, stored_at FROM playlist_cache WHERE playlist_id = ?1",
                params![playlist_id],
                |row| {
                    Ok(CacheRow {
                        items_json: row.get(0)?,
                        stored_at: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn put_cache_row(&self, playlist_id: &str, items_json: &str, stored_at: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO playlist_cache (playlist_id, items_json, stored_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(playlist_id) DO UPDATE SET
                items_json = excluded.items_json,
                stored_at = excluded.stored_at
            "#,
            params![playlist_id, items_json, stored_at],
        )?;
        Ok(())
    }

    pub fn registry_contains(&self, playlist_id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM playlist_registry WHERE playlist_id = ?1",
                params![playlist_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn insert_registry(&self, playlist_id: &str, title: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR IGNORE INTO playlist_registry (playlist_id, title, added_at) VALUES (?1, ?2, ?3)",
            params![playlist_id, title, now],
        )?;
        Ok(())
    }

    pub fn delete_registry(&self, playlist_id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM playlist_registry WHERE playlist_id = ?1",
            params![playlist_id],
        )?;
        Ok(changed > 0)
    }

    // rowid order is insertion order; added_at is informational only.
    pub fn list_registry(&self) -> Result<Vec<RegistryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT playlist_id, title FROM playlist_registry ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RegistryEntry {
                playlist_id: row.get(0)?,
                title: row.get(1)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO settings (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.migrate().expect("migrate");
        db
    }

    #[test]
    fn cache_row_roundtrips_and_overwrites() {
        let db = test_db();
        db.put_cache_row("PL1", "[]", "2026-01-01T00:00:00+00:00")
            .expect("put");
        db.put_cache_row("PL1", "[{\"id\":\"a\"}]", "2026-01-02T00:00:00+00:00")
            .expect("overwrite");

        let row = db.cache_row("PL1").expect("get").expect("row present");
        assert_eq!(row.items_json, "[{\"id\":\"a\"}]");
        assert_eq!(row.stored_at, "2026-01-02T00:00:00+00:00");
        assert!(db.cache_row("PL2").expect("get").is_none());
    }

    #[test]
    fn registry_preserves_insertion_order_and_uniqueness() {
        let db = test_db();
        db.insert_registry("PLb", "Second").expect("insert");
        db.insert_registry("PLa", "First").expect("insert");
        db.insert_registry("PLb", "Renamed").expect("dup insert");

        let entries = db.list_registry().expect("list");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].playlist_id, "PLb");
        assert_eq!(entries[0].title, "Second");
        assert_eq!(entries[1].playlist_id, "PLa");
    }

    #[test]
    fn delete_registry_reports_whether_entry_existed() {
        let db = test_db();
        db.insert_registry("PLx", "X").expect("insert");
        assert!(db.delete_registry("PLx").expect("delete"));
        assert!(!db.delete_registry("PLx").expect("delete again"));
    }

    #[test]
    fn settings_upsert() {
        let db = test_db();
        assert!(db.setting("api_key").expect("get").is_none());
        db.set_setting("api_key", "k1").expect("set");
        db.set_setting("api_key", "k2").expect("overwrite");
        assert_eq!(db.setting("api_key").expect("get").as_deref(), Some("k2"));
    }
}
