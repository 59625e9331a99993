use crate::{Result, Store};
use rookery_crypto::time::now_ms;
use rusqlite::{OptionalExtension, Row, params};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub created_at_ms: i64,
}

/// Id and email only, as shown in follower lists and profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
}

impl User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            created_at_ms: row.get(2)?,
        })
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
        }
    }
}

impl Store {
    /// Insert a user. `email` must already be normalized; a duplicate is `Conflict`.
    pub fn insert_user(&self, email: &str, password_hash: &str) -> Result<User> {
        let conn = self.conn()?;
        let created_at_ms = now_ms();
        conn.execute(
            "INSERT INTO users (email, password_hash, created_at_ms) VALUES (?1, ?2, ?3)",
            params![email, password_hash, created_at_ms],
        )?;
        Ok(User {
            id: conn.last_insert_rowid(),
            email: email.to_string(),
            created_at_ms,
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, email, created_at_ms FROM users WHERE id = ?1",
                [id],
                User::from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, email, created_at_ms FROM users WHERE email = ?1",
                [email],
                User::from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// `(user_id, password_hash)` for a login attempt.
    pub fn credentials(&self, email: &str) -> Result<Option<(i64, String)>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, password_hash FROM users WHERE email = ?1",
                [email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    pub fn user_exists(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn count_users(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn delete_user(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(n > 0)
    }
}
