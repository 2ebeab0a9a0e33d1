//! # SQLite Database
//!
//! Memo and channel preference persistence on a single SQLite connection.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: user_preferences table
//! - 1.0.0: memos table with future-time insert trigger

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::info;
use sqlite::{Connection, State, Statement};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::features::memos::{Memo, MemoStore, NewMemo, StoreError, REMIND_AT_CHECK};

/// Storage format for instants (always UTC)
pub const DB_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// SQLite rejects datetime('now') inside CHECK constraints, so the
// future-time rule on insert lives in a trigger.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS memos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id TEXT NOT NULL,
    delivery_target TEXT NOT NULL,
    content TEXT NOT NULL,
    remind_at TEXT NOT NULL,
    sent INTEGER NOT NULL DEFAULT 0 CHECK (sent IN (0, 1)),
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_memos_due ON memos (sent, remind_at);
CREATE INDEX IF NOT EXISTS idx_memos_owner ON memos (owner_id, delivery_target, sent);

CREATE TRIGGER IF NOT EXISTS memos_remind_at_check
BEFORE INSERT ON memos
WHEN NEW.remind_at <= datetime('now')
BEGIN
    SELECT RAISE(ABORT, 'remind_at_check: remind_at must be in the future');
END;

CREATE TABLE IF NOT EXISTS user_preferences (
    user_id TEXT PRIMARY KEY,
    delivery_target TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

const MEMO_COLUMNS: &str = "id, owner_id, delivery_target, content, remind_at, sent, created_at";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path` and apply the schema
    ///
    /// `":memory:"` gives a private in-memory database.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = sqlite::open(path)?;
        conn.execute(SCHEMA)?;
        info!("📦 Database ready at {path}");
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[cfg(test)]
impl Database {
    /// Move a memo's schedule, bypassing the insert trigger
    pub(crate) async fn backdate(&self, id: i64, remind_at: DateTime<Utc>) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        let mut statement = conn.prepare("UPDATE memos SET remind_at = ? WHERE id = ?")?;
        statement.bind((1, format_db_time(remind_at).as_str()))?;
        statement.bind((2, id))?;
        statement.next()?;
        Ok(())
    }
}

pub fn format_db_time(instant: DateTime<Utc>) -> String {
    instant.format(DB_TIME_FORMAT).to_string()
}

pub fn parse_db_time(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, DB_TIME_FORMAT)
        .ok()
        .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
}

/// Map the insert trigger's abort onto the typed constraint error
fn classify(err: sqlite::Error) -> StoreError {
    let hit = err
        .message
        .as_deref()
        .is_some_and(|message| message.contains(REMIND_AT_CHECK));
    if hit {
        StoreError::ScheduleConstraint
    } else {
        StoreError::Sqlite(err)
    }
}

fn read_time(statement: &Statement, column: &str) -> Result<DateTime<Utc>, StoreError> {
    let raw: String = statement.read(column)?;
    parse_db_time(&raw).ok_or_else(|| StoreError::Corrupt(format!("{column} = '{raw}'")))
}

fn read_memo(statement: &Statement) -> Result<Memo, StoreError> {
    Ok(Memo {
        id: statement.read::<i64, _>("id")?,
        owner_id: statement.read::<String, _>("owner_id")?,
        delivery_target: statement.read::<String, _>("delivery_target")?,
        content: statement.read::<String, _>("content")?,
        remind_at: read_time(statement, "remind_at")?,
        sent: statement.read::<i64, _>("sent")? != 0,
        created_at: read_time(statement, "created_at")?,
    })
}

fn collect_memos(mut statement: Statement) -> Result<Vec<Memo>, StoreError> {
    let mut memos = Vec::new();
    while let State::Row = statement.next()? {
        memos.push(read_memo(&statement)?);
    }
    Ok(memos)
}

fn select_memo(conn: &Connection, id: i64) -> Result<Option<Memo>, StoreError> {
    let mut statement = conn.prepare(format!("SELECT {MEMO_COLUMNS} FROM memos WHERE id = ?"))?;
    statement.bind((1, id))?;
    match statement.next()? {
        State::Row => Ok(Some(read_memo(&statement)?)),
        State::Done => Ok(None),
    }
}

/// First column of a single-row query
fn scalar_i64(conn: &Connection, query: &str) -> Result<i64, StoreError> {
    let mut statement = conn.prepare(query)?;
    match statement.next()? {
        State::Row => Ok(statement.read::<i64, _>(0)?),
        State::Done => Err(StoreError::Corrupt(format!("no row from `{query}`"))),
    }
}

#[async_trait]
impl MemoStore for Database {
    async fn insert_memo(&self, memo: &NewMemo) -> Result<Memo, StoreError> {
        let conn = self.conn.lock().await;

        let mut statement = conn.prepare(
            "INSERT INTO memos (owner_id, delivery_target, content, remind_at) VALUES (?, ?, ?, ?)",
        )?;
        statement.bind((1, memo.owner_id.as_str()))?;
        statement.bind((2, memo.delivery_target.as_str()))?;
        statement.bind((3, memo.content.as_str()))?;
        statement.bind((4, format_db_time(memo.remind_at).as_str()))?;
        statement.next().map_err(classify)?;
        drop(statement);

        let id = scalar_i64(&conn, "SELECT last_insert_rowid()")?;
        select_memo(&conn, id)?
            .ok_or_else(|| StoreError::Corrupt(format!("memo #{id} vanished after insert")))
    }

    async fn get_memo(&self, id: i64) -> Result<Option<Memo>, StoreError> {
        let conn = self.conn.lock().await;
        select_memo(&conn, id)
    }

    async fn list_pending(&self, owner_id: &str, target: &str) -> Result<Vec<Memo>, StoreError> {
        let conn = self.conn.lock().await;
        let mut statement = conn.prepare(format!(
            "SELECT {MEMO_COLUMNS} FROM memos
             WHERE owner_id = ? AND delivery_target = ? AND sent = 0
             ORDER BY remind_at ASC, id ASC"
        ))?;
        statement.bind((1, owner_id))?;
        statement.bind((2, target))?;
        collect_memos(statement)
    }

    async fn list_pending_in_target(&self, target: &str) -> Result<Vec<Memo>, StoreError> {
        let conn = self.conn.lock().await;
        let mut statement = conn.prepare(format!(
            "SELECT {MEMO_COLUMNS} FROM memos
             WHERE delivery_target = ? AND sent = 0
             ORDER BY remind_at ASC, id ASC"
        ))?;
        statement.bind((1, target))?;
        collect_memos(statement)
    }

    async fn pending_counts(&self, owner_id: &str) -> Result<Vec<(String, i64)>, StoreError> {
        let conn = self.conn.lock().await;
        let mut statement = conn.prepare(
            "SELECT delivery_target, COUNT(*) AS count FROM memos
             WHERE owner_id = ? AND sent = 0
             GROUP BY delivery_target
             ORDER BY delivery_target",
        )?;
        statement.bind((1, owner_id))?;

        let mut counts = Vec::new();
        while let State::Row = statement.next()? {
            counts.push((
                statement.read::<String, _>("delivery_target")?,
                statement.read::<i64, _>("count")?,
            ));
        }
        Ok(counts)
    }

    async fn delete_memo(&self, id: i64, owner_id: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().await;
        let mut statement = conn.prepare("DELETE FROM memos WHERE id = ? AND owner_id = ?")?;
        statement.bind((1, id))?;
        statement.bind((2, owner_id))?;
        statement.next()?;
        drop(statement);

        Ok(scalar_i64(&conn, "SELECT changes()")? > 0)
    }

    async fn due_memos(&self, as_of: DateTime<Utc>) -> Result<Vec<Memo>, StoreError> {
        let conn = self.conn.lock().await;
        let mut statement = conn.prepare(format!(
            "SELECT {MEMO_COLUMNS} FROM memos
             WHERE sent = 0 AND remind_at <= ?
             ORDER BY remind_at ASC, id ASC"
        ))?;
        statement.bind((1, format_db_time(as_of).as_str()))?;
        collect_memos(statement)
    }

    async fn mark_sent(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        let mut statement = conn.prepare("UPDATE memos SET sent = 1 WHERE id = ?")?;
        statement.bind((1, id))?;
        statement.next()?;
        Ok(())
    }

    async fn set_preferred_target(&self, user_id: &str, target: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        let mut statement = conn.prepare(
            "INSERT INTO user_preferences (user_id, delivery_target) VALUES (?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 delivery_target = excluded.delivery_target,
                 updated_at = CURRENT_TIMESTAMP",
        )?;
        statement.bind((1, user_id))?;
        statement.bind((2, target))?;
        statement.next()?;
        Ok(())
    }

    async fn preferred_target(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().await;
        let mut statement =
            conn.prepare("SELECT delivery_target FROM user_preferences WHERE user_id = ?")?;
        statement.bind((1, user_id))?;
        match statement.next()? {
            State::Row => Ok(Some(statement.read::<String, _>(0)?)),
            State::Done => Ok(None),
        }
    }
}
