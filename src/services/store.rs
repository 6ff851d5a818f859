//! SQLite storage for accounts, auth tokens and work sessions
//!
//! Timestamps are stored as RFC 3339 TEXT in UTC with second precision, so
//! lexicographic order matches chronological order and cutoff queries can
//! compare strings directly.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid timestamp in {table}: {value}")]
    TimestampParse {
        table: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("email already registered: {0}")]
    DuplicateEmail(String),
    #[error("no user with id {0}")]
    UnknownUser(i64),
}

/// Per-user timer preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub interval_duration_minutes: u32,
    pub break_time_counts_in_total: bool,
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub settings: UserSettings,
    pub created_at: DateTime<Utc>,
}

/// A completed, persisted work session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkSession {
    pub id: i64,
    pub user_id: i64,
    pub duration_seconds: u64,
    pub completed_cycles: u32,
    pub writing: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when recording a finished session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkSession {
    pub user_id: i64,
    pub duration_seconds: u64,
    pub completed_cycles: u32,
    pub writing: Option<String>,
}

/// Database connection wrapper
///
/// `rusqlite::Connection` is `Send` but not `Sync`; share a `Store` behind a
/// `Mutex`.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens a database at the given path, creating it if necessary
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        info!("Opened database at {}", path.display());
        Ok(store)
    }

    /// Opens an in-memory database, destroyed when the connection closes
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Idempotent schema setup
    fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                interval_duration_minutes INTEGER NOT NULL,
                break_time_counts_in_total INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS auth_tokens (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            -- duration_seconds: seconds counted by the timer between start and stop
            CREATE TABLE IF NOT EXISTS work_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                duration_seconds INTEGER NOT NULL,
                completed_cycles INTEGER NOT NULL DEFAULT 0,
                writing TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_work_sessions_user_created
                ON work_sessions(user_id, created_at);
            ",
        )?;
        Ok(())
    }

    /// Registers a new account with the given starting settings
    pub fn create_user(&mut self, email: &str, settings: UserSettings) -> Result<User, StoreError> {
        let existing: Option<i64> = self
            .conn
            .query_row("SELECT id FROM users WHERE email = ?1", params![email], |row| row.get(0))
            .optional()?;
        if existing.is_some() {
            return Err(StoreError::DuplicateEmail(email.to_string()));
        }

        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO users (email, interval_duration_minutes, break_time_counts_in_total, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                email,
                settings.interval_duration_minutes,
                settings.break_time_counts_in_total,
                format_timestamp(created_at)
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("Created user {} ({})", id, email);
        self.get_user(id)
    }

    pub fn get_user(&self, id: i64) -> Result<User, StoreError> {
        self.conn
            .query_row(
                "SELECT id, email, interval_duration_minutes, break_time_counts_in_total, created_at
                 FROM users WHERE id = ?1",
                params![id],
                read_user_row,
            )
            .optional()?
            .ok_or(StoreError::UnknownUser(id))?
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, email, interval_duration_minutes, break_time_counts_in_total, created_at
                 FROM users WHERE email = ?1",
                params![email],
                read_user_row,
            )
            .optional()?
            .transpose()
    }

    pub fn update_user_settings(&mut self, user_id: i64, settings: UserSettings) -> Result<User, StoreError> {
        let updated = self.conn.execute(
            "UPDATE users SET interval_duration_minutes = ?1, break_time_counts_in_total = ?2
             WHERE id = ?3",
            params![
                settings.interval_duration_minutes,
                settings.break_time_counts_in_total,
                user_id
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::UnknownUser(user_id));
        }
        debug!("Updated settings for user {}: {:?}", user_id, settings);
        self.get_user(user_id)
    }

    /// Issues a fresh auth token for the user
    pub fn create_auth_token(&mut self, user_id: i64) -> Result<String, StoreError> {
        let token = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO auth_tokens (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![token, user_id, format_timestamp(Utc::now())],
        )?;
        Ok(token)
    }

    pub fn user_for_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        self.conn
            .query_row(
                "SELECT u.id, u.email, u.interval_duration_minutes, u.break_time_counts_in_total, u.created_at
                 FROM auth_tokens t JOIN users u ON u.id = t.user_id
                 WHERE t.token = ?1",
                params![token],
                read_user_row,
            )
            .optional()?
            .transpose()
    }

    /// Revokes a token; returns whether it existed
    pub fn delete_auth_token(&mut self, token: &str) -> Result<bool, StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM auth_tokens WHERE token = ?1", params![token])?;
        Ok(deleted > 0)
    }

    /// Records a finished work session
    pub fn create_session(&mut self, session: NewWorkSession) -> Result<WorkSession, StoreError> {
        self.insert_session_at(session, Utc::now())
    }

    fn insert_session_at(
        &mut self,
        session: NewWorkSession,
        created_at: DateTime<Utc>,
    ) -> Result<WorkSession, StoreError> {
        self.conn.execute(
            "INSERT INTO work_sessions (user_id, duration_seconds, completed_cycles, writing, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.user_id,
                session.duration_seconds,
                session.completed_cycles,
                session.writing,
                format_timestamp(created_at)
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(
            "Recorded work session {} for user {}: {}s",
            id, session.user_id, session.duration_seconds
        );
        Ok(WorkSession {
            id,
            user_id: session.user_id,
            duration_seconds: session.duration_seconds,
            completed_cycles: session.completed_cycles,
            writing: session.writing,
            created_at: truncate_to_seconds(created_at),
        })
    }

    /// All sessions for a user, longest first
    pub fn list_sessions(&self, user_id: i64) -> Result<Vec<WorkSession>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, duration_seconds, completed_cycles, writing, created_at
             FROM work_sessions WHERE user_id = ?1
             ORDER BY duration_seconds DESC, id ASC",
        )?;
        let rows = stmt.query_map(params![user_id], read_session_row)?;
        collect_rows(rows)
    }

    /// Sessions created at or after `cutoff`, longest first
    pub fn list_sessions_since(
        &self,
        user_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<WorkSession>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, duration_seconds, completed_cycles, writing, created_at
             FROM work_sessions WHERE user_id = ?1 AND created_at >= ?2
             ORDER BY duration_seconds DESC, id ASC",
        )?;
        let rows = stmt.query_map(params![user_id, format_timestamp(cutoff)], read_session_row)?;
        collect_rows(rows)
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(table: &'static str, value: String) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|source| StoreError::TimestampParse { table, value, source })
}

fn truncate_to_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}

/// Row mappers return a nested result so timestamp errors keep their own variant
fn read_user_row(row: &Row<'_>) -> rusqlite::Result<Result<User, StoreError>> {
    let id: i64 = row.get(0)?;
    let email: String = row.get(1)?;
    let interval_duration_minutes: u32 = row.get(2)?;
    let break_time_counts_in_total: bool = row.get(3)?;
    let created_at: String = row.get(4)?;
    Ok(parse_timestamp("users", created_at).map(|created_at| User {
        id,
        email,
        settings: UserSettings {
            interval_duration_minutes,
            break_time_counts_in_total,
        },
        created_at,
    }))
}

fn read_session_row(row: &Row<'_>) -> rusqlite::Result<Result<WorkSession, StoreError>> {
    let id: i64 = row.get(0)?;
    let user_id: i64 = row.get(1)?;
    let duration_seconds: u64 = row.get(2)?;
    let completed_cycles: u32 = row.get(3)?;
    let writing: Option<String> = row.get(4)?;
    let created_at: String = row.get(5)?;
    Ok(parse_timestamp("work_sessions", created_at).map(|created_at| WorkSession {
        id,
        user_id,
        duration_seconds,
        completed_cycles,
        writing,
        created_at,
    }))
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<Result<T, StoreError>>>,
) -> Result<Vec<T>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row??);
    }
    Ok(out)
}
