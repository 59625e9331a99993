use crate::{Page, Result, Store};
use rookery_crypto::time::now_ms;
use rusqlite::{OptionalExtension, Row, params};
use serde::Serialize;

/// A 1:1 conversation. Participants are stored with `user1_id < user2_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversation {
    pub id: i64,
    pub user1_id: i64,
    pub user2_id: i64,
    pub created_at_ms: i64,
}

impl Conversation {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user1_id: row.get(1)?,
            user2_id: row.get(2)?,
            created_at_ms: row.get(3)?,
        })
    }

    pub fn has_participant(&self, user_id: i64) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The participant that is not `user_id`.
    pub fn other_participant(&self, user_id: i64) -> i64 {
        if self.user1_id == user_id {
            self.user2_id
        } else {
            self.user1_id
        }
    }
}

/// Order a pair the way conversations are keyed.
pub fn canonical_pair(a: i64, b: i64) -> (i64, i64) {
    if a < b { (a, b) } else { (b, a) }
}

/// A message row as persisted. `ciphertext` is an opaque sealed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub ciphertext: String,
    pub created_at_ms: i64,
    pub is_read: bool,
}

impl StoredMessage {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            conversation_id: row.get(1)?,
            sender_id: row.get(2)?,
            ciphertext: row.get(3)?,
            created_at_ms: row.get(4)?,
            is_read: row.get(5)?,
        })
    }
}

impl Store {
    pub fn get_conversation(&self, id: i64) -> Result<Option<Conversation>> {
        let conn = self.conn()?;
        let conv = conn
            .query_row(
                "SELECT id, user1_id, user2_id, created_at_ms FROM conversations WHERE id = ?1",
                [id],
                Conversation::from_row,
            )
            .optional()?;
        Ok(conv)
    }

    /// Look up the conversation between two users, in either order.
    pub fn find_conversation(&self, a: i64, b: i64) -> Result<Option<Conversation>> {
        let (user1_id, user2_id) = canonical_pair(a, b);
        let conn = self.conn()?;
        let conv = conn
            .query_row(
                "SELECT id, user1_id, user2_id, created_at_ms FROM conversations
                  WHERE user1_id = ?1 AND user2_id = ?2",
                params![user1_id, user2_id],
                Conversation::from_row,
            )
            .optional()?;
        Ok(conv)
    }

    /// Insert the conversation for a pair. An existing one is `Conflict`.
    pub fn insert_conversation(&self, a: i64, b: i64) -> Result<Conversation> {
        let (user1_id, user2_id) = canonical_pair(a, b);
        let conn = self.conn()?;
        let created_at_ms = now_ms();
        conn.execute(
            "INSERT INTO conversations (user1_id, user2_id, created_at_ms) VALUES (?1, ?2, ?3)",
            params![user1_id, user2_id, created_at_ms],
        )?;
        Ok(Conversation {
            id: conn.last_insert_rowid(),
            user1_id,
            user2_id,
            created_at_ms,
        })
    }

    /// Conversations `user_id` takes part in, newest first.
    pub fn list_conversations(&self, user_id: i64, page: Page) -> Result<Vec<Conversation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user1_id, user2_id, created_at_ms FROM conversations
              WHERE user1_id = ?1 OR user2_id = ?1
              ORDER BY created_at_ms DESC, id DESC
              LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![user_id, page.limit, page.offset], Conversation::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Persist a sealed message, unread.
    pub fn insert_message(
        &self,
        conversation_id: i64,
        sender_id: i64,
        ciphertext: &str,
    ) -> Result<StoredMessage> {
        let conn = self.conn()?;
        let created_at_ms = now_ms();
        conn.execute(
            "INSERT INTO messages (conversation_id, sender_id, ciphertext, created_at_ms, is_read)
                 VALUES (?1, ?2, ?3, ?4, 0)",
            params![conversation_id, sender_id, ciphertext, created_at_ms],
        )?;
        Ok(StoredMessage {
            id: conn.last_insert_rowid(),
            conversation_id,
            sender_id,
            ciphertext: ciphertext.to_string(),
            created_at_ms,
            is_read: false,
        })
    }

    /// Oldest first; equal timestamps fall back to id.
    pub fn list_messages(&self, conversation_id: i64, page: Page) -> Result<Vec<StoredMessage>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, conversation_id, sender_id, ciphertext, created_at_ms, is_read
               FROM messages WHERE conversation_id = ?1
              ORDER BY created_at_ms, id
              LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(
            params![conversation_id, page.limit, page.offset],
            StoredMessage::from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Messages in the conversation that `viewer_id` did not send and has not read.
    pub fn unread_count(&self, conversation_id: i64, viewer_id: i64) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages
              WHERE conversation_id = ?1 AND sender_id != ?2 AND is_read = 0",
            params![conversation_id, viewer_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Flip the set counted by [`Store::unread_count`] to read. Returns how many changed.
    pub fn mark_read(&self, conversation_id: i64, viewer_id: i64) -> Result<usize> {
        let conn = self.conn()?;
        let n = conn.execute(
            "UPDATE messages SET is_read = 1
              WHERE conversation_id = ?1 AND sender_id != ?2 AND is_read = 0",
            params![conversation_id, viewer_id],
        )?;
        Ok(n)
    }

    /// Overwrite a stored payload. Only used to simulate corruption in tests.
    #[doc(hidden)]
    pub fn overwrite_ciphertext(&self, message_id: i64, ciphertext: &str) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn.execute(
            "UPDATE messages SET ciphertext = ?2 WHERE id = ?1",
            params![message_id, ciphertext],
        )?;
        Ok(n > 0)
    }
}
