use rusqlite::{params, Connection, OptionalExtension, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub github_id: String,
    pub username: String,
}

/// Local record of users who signed in through GitHub.
pub struct UserDb {
    conn: Mutex<Connection>,
}

impl UserDb {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        info!("User database opened at {}", db_path.as_ref().display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                github_id TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Inserts the user, or refreshes the username if the GitHub id is known.
    pub fn upsert_user(&self, github_id: &str, username: &str) -> Result<User> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare_cached(
            "INSERT INTO users (github_id, username) VALUES (?1, ?2)
             ON CONFLICT(github_id) DO UPDATE SET username = excluded.username
             RETURNING id, github_id, username",
        )?;
        stmt.query_row(params![github_id, username], row_to_user)
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt =
            conn.prepare_cached("SELECT id, github_id, username FROM users WHERE id = ?1")?;
        stmt.query_row(params![id], row_to_user).optional()
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> Result<User> {
    Ok(User {
        id: row.get(0)?,
        github_id: row.get(1)?,
        username: row.get(2)?,
    })
}
