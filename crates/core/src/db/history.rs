use std::path::Path;

use chrono::Utc;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for history database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// One saved design state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: i64,
    /// Edit that produced this state, e.g. "Add block main".
    pub action: String,
    /// Serialized design.
    pub state: String,
    pub state_hash: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

/// SQLite-backed linear undo/redo history.
///
/// Checkpoints form a line; a cursor marks the one matching the design on
/// disk. Recording after an undo discards everything past the cursor.
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn map_checkpoint(row: &rusqlite::Row<'_>) -> rusqlite::Result<Checkpoint> {
    Ok(Checkpoint {
        id: row.get(0)?,
        action: row.get(1)?,
        state: row.get(2)?,
        state_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

const SELECT_CHECKPOINT: &str = "SELECT id, action, state, state_hash, created_at FROM checkpoints";

impl HistoryDb {
    /// Open (or create) a history database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn cursor(&self) -> DbResult<Option<i64>> {
        let id = self
            .conn
            .query_row("SELECT checkpoint_id FROM cursor WHERE id = 1", [], |row| row.get::<_, Option<i64>>(0))
            .optional()?;
        Ok(id.flatten())
    }

    fn checkpoint(&self, id: i64) -> DbResult<Option<Checkpoint>> {
        let sql = format!("{SELECT_CHECKPOINT} WHERE id = ?1");
        Ok(self.conn.query_row(&sql, params![id], map_checkpoint).optional()?)
    }

    fn move_cursor(&self, id: i64) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO cursor (id, checkpoint_id) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET checkpoint_id = excluded.checkpoint_id",
            params![id],
        )?;
        Ok(())
    }

    /// The checkpoint the cursor points at.
    pub fn current(&self) -> DbResult<Option<Checkpoint>> {
        match self.cursor()? {
            Some(id) => self.checkpoint(id),
            None => Ok(None),
        }
    }

    /// Record a new state after the cursor.
    ///
    /// Returns `None` without writing when `state` equals the current checkpoint.
    pub fn record(&mut self, action: &str, state: &str) -> DbResult<Option<i64>> {
        let hash = sha256_hex(state.as_bytes());
        let cursor = self.cursor()?;
        if let Some(current) = self.current()? {
            if current.state_hash == hash {
                debug!("history: '{}' left the design unchanged", action);
                return Ok(None);
            }
        }

        let created_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        match cursor {
            Some(id) => tx.execute("DELETE FROM checkpoints WHERE id > ?1", params![id])?,
            None => tx.execute("DELETE FROM checkpoints", [])?,
        };
        tx.execute(
            "INSERT INTO checkpoints (action, state, state_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![action, state, hash, created_at],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO cursor (id, checkpoint_id) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET checkpoint_id = excluded.checkpoint_id",
            params![id],
        )?;
        tx.commit()?;
        info!("history: recorded checkpoint {} ({})", id, action);
        Ok(Some(id))
    }

    /// Step back one checkpoint. Returns the state to restore, or `None` at the start.
    pub fn undo(&self) -> DbResult<Option<Checkpoint>> {
        let Some(cursor) = self.cursor()? else {
            return Ok(None);
        };
        let sql = format!("{SELECT_CHECKPOINT} WHERE id < ?1 ORDER BY id DESC LIMIT 1");
        let prev = self.conn.query_row(&sql, params![cursor], map_checkpoint).optional()?;
        if let Some(cp) = &prev {
            self.move_cursor(cp.id)?;
            info!("history: undo to checkpoint {} ({})", cp.id, cp.action);
        }
        Ok(prev)
    }

    /// Step forward one checkpoint. Returns the state to restore, or `None` at the end.
    pub fn redo(&self) -> DbResult<Option<Checkpoint>> {
        let cursor = self.cursor()?.unwrap_or(0);
        let sql = format!("{SELECT_CHECKPOINT} WHERE id > ?1 ORDER BY id ASC LIMIT 1");
        let next = self.conn.query_row(&sql, params![cursor], map_checkpoint).optional()?;
        if let Some(cp) = &next {
            self.move_cursor(cp.id)?;
            info!("history: redo to checkpoint {} ({})", cp.id, cp.action);
        }
        Ok(next)
    }

    /// All checkpoints, oldest first.
    pub fn list(&self) -> DbResult<Vec<Checkpoint>> {
        let sql = format!("{SELECT_CHECKPOINT} ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_checkpoint)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Id of the checkpoint the cursor points at.
    pub fn current_id(&self) -> DbResult<Option<i64>> {
        self.cursor()
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// `PRAGMA user_version` is the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: checkpoints table
/// - 2: cursor table and hash index
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let current_version = current_schema_version(conn)?;

    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version < 1 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS checkpoints (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                action      TEXT NOT NULL,
                state       TEXT NOT NULL,
                state_hash  TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS cursor (
                id             INTEGER PRIMARY KEY CHECK (id = 1),
                checkpoint_id  INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_checkpoints_hash ON checkpoints(state_hash);

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
pub fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
