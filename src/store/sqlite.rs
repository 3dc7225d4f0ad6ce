use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{IslanderError, Result};
use crate::domain::Identity;
use crate::store::IdentityStore;

const CURRENT_IDENTITY_KEY: &str = "current-identity";

pub struct SqliteIdentityStore {
    conn: Mutex<Connection>,
}

impl SqliteIdentityStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| IslanderError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            IslanderError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    fn row_to_identity(row: &rusqlite::Row<'_>) -> rusqlite::Result<Identity> {
        Ok(Identity {
            name: row.get(0)?,
            token: row.get(1)?,
            created_at: row
                .get::<_, String>(2)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }

    fn find_with(conn: &Connection, name: &str) -> Result<Option<Identity>> {
        let identity = conn
            .query_row(
                "SELECT name, token, created_at FROM identities WHERE name = ?1",
                params![name],
                Self::row_to_identity,
            )
            .optional()?;
        Ok(identity)
    }
}

impl IdentityStore for SqliteIdentityStore {
    fn add(&self, identity: &Identity) -> Result<()> {
        let conn = self.lock()?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO identities (name, token, created_at) VALUES (?1, ?2, ?3)",
            params![
                identity.name,
                identity.token,
                identity.created_at.to_rfc3339()
            ],
        )?;

        if inserted == 0 {
            return Err(IslanderError::IdentityExists(identity.name.clone()));
        }

        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let removed = tx.execute("DELETE FROM identities WHERE name = ?1", params![name])?;
        if removed == 0 {
            return Err(IslanderError::IdentityNotFound(name.to_string()));
        }

        // Removing the selected identity also drops the selection
        tx.execute(
            "DELETE FROM settings WHERE key = ?1 AND value = ?2",
            params![CURRENT_IDENTITY_KEY, name],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Identity>> {
        let conn = self.lock()?;
        Self::find_with(&conn, name)
    }

    fn list(&self) -> Result<Vec<Identity>> {
        let conn = self.lock()?;

        let mut stmt =
            conn.prepare("SELECT name, token, created_at FROM identities ORDER BY name")?;
        let identities = stmt
            .query_map([], Self::row_to_identity)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(identities)
    }

    fn get_current(&self) -> Result<Option<Identity>> {
        let conn = self.lock()?;

        let name: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![CURRENT_IDENTITY_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match name {
            Some(name) => Self::find_with(&conn, &name),
            None => Ok(None),
        }
    }

    fn set_current(&self, name: &str) -> Result<()> {
        let conn = self.lock()?;

        if Self::find_with(&conn, name)?.is_none() {
            return Err(IslanderError::IdentityNotFound(name.to_string()));
        }

        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![CURRENT_IDENTITY_KEY, name],
        )?;

        Ok(())
    }

    fn clear_current(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM settings WHERE key = ?1",
            params![CURRENT_IDENTITY_KEY],
        )?;
        Ok(())
    }
}
