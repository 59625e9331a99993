//! SQLite persistence for users, sessions, the follow graph, posts,
//! conversations and notifications.
//!
//! Every call is synchronous and takes the connection lock for its
//! duration; async callers wrap it in `spawn_blocking`.

pub mod error;
pub mod follows;
pub mod messaging;
pub mod notifications;
pub mod posts;
pub mod sessions;
pub mod users;

pub use error::{Result, StoreError};
pub use messaging::{Conversation, StoredMessage, canonical_pair};
pub use notifications::{Notification, NotificationKind};
pub use posts::{Comment, Post, PostScope, PostWithStats};
pub use sessions::Session;
pub use users::{User, UserSummary};

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    email           TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,
    created_at_ms   INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token_digest    TEXT PRIMARY KEY NOT NULL,
    user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at_ms   INTEGER NOT NULL,
    expires_at_ms   INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

CREATE TABLE IF NOT EXISTS follows (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    follower_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    following_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at_ms   INTEGER NOT NULL,
    UNIQUE (follower_id, following_id)
);
CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id);

CREATE TABLE IF NOT EXISTS posts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    content         TEXT NOT NULL,
    created_at_ms   INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_posts_owner ON posts(owner_id);

CREATE TABLE IF NOT EXISTS comments (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id         INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    owner_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    content         TEXT NOT NULL,
    created_at_ms   INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);

CREATE TABLE IF NOT EXISTS likes (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id         INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at_ms   INTEGER NOT NULL,
    UNIQUE (post_id, user_id)
);

CREATE TABLE IF NOT EXISTS conversations (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user1_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    user2_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at_ms   INTEGER NOT NULL,
    CHECK (user1_id < user2_id),
    UNIQUE (user1_id, user2_id)
);
CREATE INDEX IF NOT EXISTS idx_conversations_user2 ON conversations(user2_id);

CREATE TABLE IF NOT EXISTS messages (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    conversation_id INTEGER NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
    sender_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    ciphertext      TEXT NOT NULL,
    created_at_ms   INTEGER NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, is_read);

CREATE TABLE IF NOT EXISTS notifications (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    kind            TEXT NOT NULL,
    message         TEXT NOT NULL,
    created_at_ms   INTEGER NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, is_read);
";

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A `LIMIT`/`OFFSET` window over an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    /// Missing values fall back to defaults; `limit` is clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self::with_default(limit, offset, DEFAULT_PAGE_LIMIT)
    }

    pub fn with_default(limit: Option<u32>, offset: Option<u32>, default_limit: u32) -> Self {
        Self {
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// SQLite-backed store. `rusqlite::Connection` is `Send` but not `Sync`;
/// the mutex makes `&Store` shareable across blocking worker threads.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) a database file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        // WAL mode for better concurrent read performance
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();

        let store = Self::init(conn)?;
        let users = store.count_users()?;
        tracing::info!(path = %path.display(), users, "opened database");
        Ok(store)
    }

    /// A private database that lives as long as the store.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Cheap liveness probe.
    pub fn ping(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Store;

    pub fn store() -> Store {
        Store::open_in_memory().unwrap()
    }

    pub fn user(store: &Store, email: &str) -> i64 {
        store.insert_user(email, "$argon2id$test").unwrap().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(Page::default(), Page { limit: 20, offset: 0 });
        assert_eq!(Page::new(Some(500), Some(7)), Page { limit: 100, offset: 7 });
        assert_eq!(Page::new(Some(0), None).limit, 1);
        assert_eq!(Page::with_default(None, None, 50).limit, 50);
    }

    #[test]
    fn file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rookery.db");
        {
            let store = Store::open(&path).unwrap();
            store.insert_user("alice@example.com", "hash").unwrap();
        }
        let store = Store::open(&path).unwrap();
        let user = store.find_user_by_email("alice@example.com").unwrap();
        assert!(user.is_some());
        store.ping().unwrap();
    }

    #[test]
    fn schema_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rookery.db");
        Store::open(&path).unwrap();
        Store::open(&path).unwrap();
    }
}
