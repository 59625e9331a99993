use crate::{Result, Store};
use rookery_crypto::time::now_ms;
use rusqlite::{OptionalExtension, params};

/// A stored session, looked up by the digest of its bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub expires_at_ms: i64,
}

impl Store {
    pub fn insert_session(&self, token_digest: &str, user_id: i64, expires_at_ms: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sessions (token_digest, user_id, created_at_ms, expires_at_ms)
                 VALUES (?1, ?2, ?3, ?4)",
            params![token_digest, user_id, now_ms(), expires_at_ms],
        )?;
        Ok(())
    }

    pub fn get_session(&self, token_digest: &str) -> Result<Option<Session>> {
        let conn = self.conn()?;
        let session = conn
            .query_row(
                "SELECT user_id, expires_at_ms FROM sessions WHERE token_digest = ?1",
                [token_digest],
                |row| {
                    Ok(Session {
                        user_id: row.get(0)?,
                        expires_at_ms: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    /// Returns whether a session was removed.
    pub fn delete_session(&self, token_digest: &str) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn.execute("DELETE FROM sessions WHERE token_digest = ?1", [token_digest])?;
        Ok(n > 0)
    }

    /// Drop every session of `user_id` that expired before `now_ms`.
    pub fn delete_expired_sessions(&self, user_id: i64, now_ms: i64) -> Result<usize> {
        let conn = self.conn()?;
        let n = conn.execute(
            "DELETE FROM sessions WHERE user_id = ?1 AND expires_at_ms <= ?2",
            params![user_id, now_ms],
        )?;
        Ok(n)
    }
}
