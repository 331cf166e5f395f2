//! Session persistence using SQLite
//!
//! Uniqueness of live session ids and of active owners is enforced by
//! partial unique indexes, so an insert is a single atomic check-and-write:
//! concurrent creators race inside SQLite, and the loser gets a constraint
//! violation rather than a duplicate row.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::session::{NewSession, SessionPatch, SessionRecord, SessionState};
use crate::{Error, Result};

/// SQLite-based session store
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Create a new session store with the given database path
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    /// Create an in-memory session store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    /// Initialize database tables
    fn init_tables(&self) -> Result<()> {
        // AUTOINCREMENT keeps rowids from ever being reused, even after
        // terminal records are eventually garbage-collected externally.
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                owner_address TEXT NOT NULL,
                session_id TEXT NOT NULL,
                secret TEXT NOT NULL,
                host_address TEXT NOT NULL,
                port INTEGER NOT NULL DEFAULT 0,
                state INTEGER NOT NULL,
                title TEXT NOT NULL,
                total_slots INTEGER NOT NULL,
                used_slots INTEGER NOT NULL DEFAULT 0,
                info TEXT NOT NULL,
                CHECK (expires_at > created_at),
                CHECK (used_slots >= 0 AND used_slots <= total_slots)
            )",
            [],
        )?;

        // State integers: 5 = Closed, 6 = Timeout (terminal), 2 = Active.
        // A session id may be reused once its previous holder is terminal;
        // an owner may hold at most one Active session.
        self.conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_live_session_id
             ON sessions(session_id) WHERE state NOT IN (5, 6)",
            [],
        )?;
        self.conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_active_owner_address
             ON sessions(owner_address) WHERE state = 2",
            [],
        )?;

        // Covering index for list queries
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_game_state
             ON sessions(game_id, state, expires_at)",
            [],
        )?;

        Ok(())
    }

    /// Insert a new session.
    ///
    /// The uniqueness checks and the write are one statement; a partial
    /// unique index violation is the failure signal and is mapped to
    /// [`Error::OwnerExists`] or [`Error::SessionExists`].
    pub fn insert(&self, session: &NewSession) -> Result<i64> {
        let result = self.conn.execute(
            "INSERT INTO sessions (
                game_id, created_at, expires_at, owner_address, session_id,
                secret, host_address, port, state, title, total_slots,
                used_slots, info
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, ?12)",
            params![
                session.game_id,
                session.created_at.timestamp(),
                session.expires_at.timestamp(),
                session.owner_address,
                session.session_id,
                session.secret,
                session.host_address,
                session.port,
                session.state.as_wire(),
                session.title,
                session.total_slots,
                session.info,
            ],
        );

        match result {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) => Err(classify_insert_conflict(e)),
        }
    }

    /// Find sessions for a game in the given state whose lease outlives
    /// `as_of`, in insertion order, at most `limit` rows.
    pub fn find_by_game(
        &self,
        game_id: &str,
        state: SessionState,
        as_of: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, game_id, created_at, expires_at, owner_address, session_id,
                    secret, host_address, port, state, title, total_slots, used_slots, info
             FROM sessions
             WHERE game_id = ?1 AND state = ?2 AND expires_at > ?3
             ORDER BY id
             LIMIT ?4",
        )?;

        let rows = stmt.query_map(
            params![game_id, state.as_wire(), as_of.timestamp(), limit as i64],
            record_from_row,
        )?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Look up the most recent record for a session id.
    ///
    /// Terminal records are retained, so after a close-and-recreate several
    /// rows may share the id; the newest one is the authoritative record.
    pub fn find_by_session_id(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, game_id, created_at, expires_at, owner_address, session_id,
                    secret, host_address, port, state, title, total_slots, used_slots, info
             FROM sessions
             WHERE session_id = ?1
             ORDER BY id DESC
             LIMIT 1",
        )?;

        match stmt.query_row(params![session_id], record_from_row) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::from(e)),
        }
    }

    /// Apply a partial update to a record; authorization happened upstream.
    pub fn update_fields(&self, id: i64, patch: &SessionPatch) -> Result<()> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(expires_at) = patch.expires_at {
            sets.push("expires_at = ?");
            values.push(Box::new(expires_at.timestamp()));
        }
        if let Some(state) = patch.state {
            sets.push("state = ?");
            values.push(Box::new(state.as_wire()));
        }
        if let Some(used_slots) = patch.used_slots {
            sets.push("used_slots = ?");
            values.push(Box::new(used_slots));
        }
        if let Some(info) = &patch.info {
            sets.push("info = ?");
            values.push(Box::new(info.clone()));
        }

        if sets.is_empty() {
            return Ok(());
        }

        let sql = format!("UPDATE sessions SET {} WHERE id = ?", sets.join(", "));
        values.push(Box::new(id));

        let affected = self
            .conn
            .execute(&sql, rusqlite::params_from_iter(values))?;
        if affected == 0 {
            return Err(Error::SessionNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Move every Active or Started session whose lease has lapsed to
    /// Timeout. One atomic statement, safe to run concurrently with inserts
    /// and updates; repeating it with the same `as_of` is a no-op.
    pub fn sweep_expired(&self, as_of: DateTime<Utc>) -> Result<usize> {
        let affected = self.conn.execute(
            "UPDATE sessions SET state = 6 WHERE state IN (2, 3) AND expires_at < ?1",
            params![as_of.timestamp()],
        )?;
        Ok(affected)
    }
}

/// Map a unique-index violation on insert to the matching registry error.
fn classify_insert_conflict(e: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(code, Some(message)) = &e {
        if code.code == rusqlite::ErrorCode::ConstraintViolation {
            if message.contains("owner_address") {
                return Error::OwnerExists;
            }
            if message.contains("session_id") {
                return Error::SessionExists;
            }
        }
    }
    Error::Storage(e)
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRecord> {
    let created_at: i64 = row.get(2)?;
    let expires_at: i64 = row.get(3)?;
    let state: i64 = row.get(9)?;

    Ok(SessionRecord {
        id: row.get(0)?,
        game_id: row.get(1)?,
        created_at: DateTime::from_timestamp(created_at, 0)
            .ok_or(rusqlite::Error::InvalidQuery)?,
        expires_at: DateTime::from_timestamp(expires_at, 0)
            .ok_or(rusqlite::Error::InvalidQuery)?,
        owner_address: row.get(4)?,
        session_id: row.get(5)?,
        secret: row.get(6)?,
        host_address: row.get(7)?,
        port: row.get(8)?,
        state: SessionState::from_wire(state).ok_or(rusqlite::Error::InvalidQuery)?,
        title: row.get(10)?,
        total_slots: row.get(11)?,
        used_slots: row.get(12)?,
        info: row.get(13)?,
    })
}
