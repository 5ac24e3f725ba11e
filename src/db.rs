//! SQLite storage used by the art cache and the HTTP handlers.
//!
//! A single connection sits behind a mutex. Every statement goes through a
//! small retry loop: `SQLITE_BUSY` has its own timeout inside SQLite, but
//! `SQLITE_LOCKED` does not, so we sleep before trying again.

use parking_lot::Mutex;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, ToSql, types::Value};
use std::path::Path;
use std::time::Duration;

/// Schema version stamped into `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 11;

const BUSY_RETRIES: usize = 2;
const LOCKED_SLEEP: Duration = Duration::from_secs(1);

/// Outcome of comparing the on-disk schema with [`SCHEMA_VERSION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    Current,
    /// Written by a newer release; refuse to touch it.
    Unsupported(i32),
    /// Empty or foreign database.
    NeedsInit,
    /// Too old to migrate in place; a rescan is required.
    NeedsUpgrade(i32),
}

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    /// Creates the tables this server reads and writes.
    pub fn init_schema(&self) -> rusqlite::Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS ALBUM_ART (
                ID      INTEGER PRIMARY KEY AUTOINCREMENT,
                PATH    TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS IDX_ALBUM_ART_PATH ON ALBUM_ART(PATH);
            CREATE TABLE IF NOT EXISTS DETAILS (
                ID          INTEGER PRIMARY KEY AUTOINCREMENT,
                PATH        TEXT DEFAULT NULL,
                MIME        TEXT,
                DLNA_PN     TEXT,
                RESOLUTION  TEXT,
                THUMBNAIL   BOOL DEFAULT 0,
                ALBUM_ART   INTEGER DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS IDX_DETAILS_PATH ON DETAILS(PATH);",
        )?;
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
        Ok(())
    }

    pub fn schema_status(&self) -> rusqlite::Result<SchemaStatus> {
        let version = self.query_int("PRAGMA user_version", &[])?;

        if version == SCHEMA_VERSION {
            return Ok(SchemaStatus::Current);
        }
        if version > SCHEMA_VERSION {
            return Ok(SchemaStatus::Unsupported(version));
        }
        if version < 1 {
            return Ok(SchemaStatus::NeedsInit);
        }
        if version < 9 {
            return Ok(SchemaStatus::NeedsUpgrade(version));
        }

        self.exec(&format!("PRAGMA user_version = {SCHEMA_VERSION}"), &[])?;
        Ok(SchemaStatus::Current)
    }

    /// Drops every table we own in one exclusive transaction.
    pub fn clear(&self) -> rusqlite::Result<()> {
        let tables: Vec<String> = self.query_rows(
            "SELECT name FROM sqlite_master WHERE type = 'table'",
            &[],
            |row| row.get(0),
        )?;

        let mut sql = String::from("BEGIN EXCLUSIVE TRANSACTION;");
        for table in tables.iter().rev() {
            // sqlite_sequence belongs to SQLite itself
            if table == "sqlite_sequence" {
                continue;
            }
            sql.push_str(&format!("DROP TABLE IF EXISTS \"{}\";", table.replace('"', "\"\"")));
        }
        sql.push_str("COMMIT TRANSACTION;");

        tracing::debug!(sql = %sql, "Dropping all database tables");
        self.with_retry(|conn| conn.execute_batch(&sql))?;
        tracing::info!(count = tables.len(), "Dropped all database tables");
        Ok(())
    }

    /// Runs a statement, returning the number of changed rows.
    pub fn exec(&self, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<usize> {
        self.with_retry(|conn| conn.execute(sql, params))
            .inspect_err(|e| tracing::error!(error = %e, sql = %sql, "SQL error"))
    }

    /// Runs an INSERT and returns the new row id.
    pub fn insert(&self, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<i64> {
        self.with_retry(|conn| {
            conn.execute(sql, params)?;
            Ok(conn.last_insert_rowid())
        })
        .inspect_err(|e| tracing::error!(error = %e, sql = %sql, "SQL error"))
    }

    /// First column of the first row as an integer; no row or NULL is 0.
    pub fn query_int(&self, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<i32> {
        self.query_int64(sql, params).map(|v| v as i32)
    }

    pub fn query_int64(&self, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<i64> {
        let value = self.query_scalar(sql, params)?;
        Ok(match value {
            Some(Value::Integer(i)) => i,
            Some(Value::Real(f)) => f as i64,
            Some(Value::Text(t)) => t.trim().parse().unwrap_or(0),
            _ => 0,
        })
    }

    pub fn query_text(&self, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<Option<String>> {
        let value = self.query_scalar(sql, params)?;
        Ok(match value {
            Some(Value::Text(t)) => Some(t),
            Some(Value::Integer(i)) => Some(i.to_string()),
            Some(Value::Real(f)) => Some(f.to_string()),
            Some(Value::Blob(b)) => Some(String::from_utf8_lossy(&b).into_owned()),
            _ => None,
        })
    }

    pub fn query_rows<T, F>(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
        mut map: F,
    ) -> rusqlite::Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.with_retry(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params, &mut map)?;
            rows.collect()
        })
        .inspect_err(|e| tracing::warn!(error = %e, sql = %sql, "SQL query failed"))
    }

    fn query_scalar(&self, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<Option<Value>> {
        self.with_retry(|conn| {
            conn.query_row(sql, params, |row| row.get::<_, Value>(0))
                .optional()
        })
        .inspect_err(|e| tracing::warn!(error = %e, sql = %sql, "SQL query failed"))
    }

    fn with_retry<T>(
        &self,
        mut op: impl FnMut(&Connection) -> rusqlite::Result<T>,
    ) -> rusqlite::Result<T> {
        let conn = self.conn.lock();
        let mut attempt = 0;
        loop {
            match op(&conn) {
                Err(e) if attempt < BUSY_RETRIES && is_transient(&e) => {
                    attempt += 1;
                    if e.sqlite_error_code() == Some(ErrorCode::DatabaseLocked) {
                        std::thread::sleep(LOCKED_SLEEP);
                    }
                    tracing::debug!(attempt, error = %e, "Retrying busy statement");
                }
                other => return other,
            }
        }
    }
}

fn is_transient(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rows_read_as_zero_or_none() {
        let db = Database::open_in_memory().unwrap();
        db.init_schema().unwrap();

        assert_eq!(db.query_int("SELECT ID FROM ALBUM_ART WHERE PATH = ?1", &[&"x"]).unwrap(), 0);
        assert_eq!(db.query_text("SELECT PATH FROM ALBUM_ART WHERE ID = 7", &[]).unwrap(), None);
    }

    #[test]
    fn insert_returns_row_id() {
        let db = Database::open_in_memory().unwrap();
        db.init_schema().unwrap();

        let first = db.insert("INSERT INTO ALBUM_ART (PATH) VALUES (?1)", &[&"/a.jpg"]).unwrap();
        let second = db.insert("INSERT INTO ALBUM_ART (PATH) VALUES (?1)", &[&"/b.jpg"]).unwrap();

        assert_eq!(second, first + 1);
        assert_eq!(
            db.query_text("SELECT PATH FROM ALBUM_ART WHERE ID = ?1", &[&second]).unwrap(),
            Some("/b.jpg".to_string())
        );
    }
}
