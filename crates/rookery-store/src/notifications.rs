use crate::{Page, Result, Store, StoreError};
use rookery_crypto::time::now_ms;
use rusqlite::params;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Follow,
    Like,
    Comment,
    Message,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Follow => "follow",
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Message => "message",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = StoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "follow" => Ok(NotificationKind::Follow),
            "like" => Ok(NotificationKind::Like),
            "comment" => Ok(NotificationKind::Comment),
            "message" => Ok(NotificationKind::Message),
            other => Err(StoreError::Corrupt(format!("unknown notification kind {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at_ms: i64,
    pub is_read: bool,
}

impl Store {
    pub fn insert_notification(
        &self,
        user_id: i64,
        kind: NotificationKind,
        message: &str,
    ) -> Result<Notification> {
        let conn = self.conn()?;
        let created_at_ms = now_ms();
        conn.execute(
            "INSERT INTO notifications (user_id, kind, message, created_at_ms, is_read)
                 VALUES (?1, ?2, ?3, ?4, 0)",
            params![user_id, kind.as_str(), message, created_at_ms],
        )?;
        Ok(Notification {
            id: conn.last_insert_rowid(),
            user_id,
            kind,
            message: message.to_string(),
            created_at_ms,
            is_read: false,
        })
    }

    /// Newest first.
    pub fn list_notifications(&self, user_id: i64, page: Page) -> Result<Vec<Notification>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, kind, message, created_at_ms, is_read FROM notifications
              WHERE user_id = ?1
              ORDER BY created_at_ms DESC, id DESC
              LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![user_id, page.limit, page.offset], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, bool>(5)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, user_id, kind, message, created_at_ms, is_read) = row?;
            out.push(Notification {
                id,
                user_id,
                kind: kind.parse()?,
                message,
                created_at_ms,
                is_read,
            });
        }
        Ok(out)
    }

    /// Mark one notification read, but only if it belongs to `user_id`.
    /// Returns `false` when no such notification exists for that user.
    pub fn mark_notification_read(&self, id: i64, user_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(n > 0)
    }

    pub fn mark_all_notifications_read(&self, user_id: i64) -> Result<usize> {
        let conn = self.conn()?;
        let n = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
            [user_id],
        )?;
        Ok(n)
    }

    pub fn unread_notification_count(&self, user_id: i64) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Drop the notifications table so later writes to it fail. Only used
    /// to simulate a failing notification write in tests.
    #[doc(hidden)]
    pub fn drop_notifications_table(&self) -> Result<()> {
        self.conn()?.execute_batch("DROP TABLE notifications")?;
        Ok(())
    }
}
