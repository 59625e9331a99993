use crate::{Page, Result, Store};
use rookery_crypto::time::now_ms;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: i64,
    pub owner_id: i64,
    pub content: String,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub owner_id: i64,
    pub content: String,
    pub created_at_ms: i64,
}

/// A post with its author's email, counters and comments (oldest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostWithStats {
    pub id: i64,
    pub owner_id: i64,
    pub owner_email: String,
    pub content: String,
    pub created_at_ms: i64,
    pub likes_count: u64,
    pub comments_count: u64,
    pub comments: Vec<Comment>,
}

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    /// Posts written by this user.
    Owner(i64),
    /// Posts written by anyone this user follows.
    FollowedBy(i64),
}

impl PostScope {
    fn filter(&self) -> (&'static str, Option<i64>) {
        match self {
            PostScope::All => ("?3 IS NULL", None),
            PostScope::Owner(id) => ("p.owner_id = ?3", Some(*id)),
            PostScope::FollowedBy(id) => (
                "p.owner_id IN (SELECT following_id FROM follows WHERE follower_id = ?3)",
                Some(*id),
            ),
        }
    }
}

const POST_WITH_STATS_COLUMNS: &str = "
    p.id, p.owner_id, u.email, p.content, p.created_at_ms,
    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id),
    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)";

impl Post {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            content: row.get(2)?,
            created_at_ms: row.get(3)?,
        })
    }
}

impl Comment {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            post_id: row.get(1)?,
            owner_id: row.get(2)?,
            content: row.get(3)?,
            created_at_ms: row.get(4)?,
        })
    }
}

impl PostWithStats {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let likes: i64 = row.get(5)?;
        let comments: i64 = row.get(6)?;
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            owner_email: row.get(2)?,
            content: row.get(3)?,
            created_at_ms: row.get(4)?,
            likes_count: likes as u64,
            comments_count: comments as u64,
            comments: Vec::new(),
        })
    }
}

fn attach_comments(conn: &Connection, post: &mut PostWithStats) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, post_id, owner_id, content, created_at_ms FROM comments
          WHERE post_id = ?1 ORDER BY created_at_ms, id",
    )?;
    post.comments = stmt
        .query_map([post.id], Comment::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(())
}

impl Store {
    pub fn insert_post(&self, owner_id: i64, content: &str) -> Result<Post> {
        let conn = self.conn()?;
        let created_at_ms = now_ms();
        conn.execute(
            "INSERT INTO posts (owner_id, content, created_at_ms) VALUES (?1, ?2, ?3)",
            params![owner_id, content, created_at_ms],
        )?;
        Ok(Post {
            id: conn.last_insert_rowid(),
            owner_id,
            content: content.to_string(),
            created_at_ms,
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let conn = self.conn()?;
        let post = conn
            .query_row(
                "SELECT id, owner_id, content, created_at_ms FROM posts WHERE id = ?1",
                [id],
                Post::from_row,
            )
            .optional()?;
        Ok(post)
    }

    /// Returns the updated post, or `None` if it does not exist.
    pub fn update_post(&self, id: i64, content: &str) -> Result<Option<Post>> {
        let conn = self.conn()?;
        let post = conn
            .query_row(
                "UPDATE posts SET content = ?2 WHERE id = ?1
                 RETURNING id, owner_id, content, created_at_ms",
                params![id, content],
                Post::from_row,
            )
            .optional()?;
        Ok(post)
    }

    /// Comments and likes go with the post.
    pub fn delete_post(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
        Ok(n > 0)
    }

    pub fn get_post_with_stats(&self, id: i64) -> Result<Option<PostWithStats>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {POST_WITH_STATS_COLUMNS}
               FROM posts p JOIN users u ON u.id = p.owner_id
              WHERE p.id = ?1"
        );
        let Some(mut post) = conn
            .query_row(&sql, [id], PostWithStats::from_row)
            .optional()?
        else {
            return Ok(None);
        };
        attach_comments(&conn, &mut post)?;
        Ok(Some(post))
    }

    /// Newest first; equal timestamps fall back to id.
    pub fn list_posts(&self, scope: PostScope, page: Page) -> Result<Vec<PostWithStats>> {
        let conn = self.conn()?;
        let (filter, subject) = scope.filter();
        let sql = format!(
            "SELECT {POST_WITH_STATS_COLUMNS}
               FROM posts p JOIN users u ON u.id = p.owner_id
              WHERE {filter}
              ORDER BY p.created_at_ms DESC, p.id DESC
              LIMIT ?1 OFFSET ?2"
        );
        let mut posts = {
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map(
                params![page.limit, page.offset, subject],
                PostWithStats::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        for post in &mut posts {
            attach_comments(&conn, post)?;
        }
        Ok(posts)
    }

    pub fn insert_comment(&self, post_id: i64, owner_id: i64, content: &str) -> Result<Comment> {
        let conn = self.conn()?;
        let created_at_ms = now_ms();
        conn.execute(
            "INSERT INTO comments (post_id, owner_id, content, created_at_ms)
                 VALUES (?1, ?2, ?3, ?4)",
            params![post_id, owner_id, content, created_at_ms],
        )?;
        Ok(Comment {
            id: conn.last_insert_rowid(),
            post_id,
            owner_id,
            content: content.to_string(),
            created_at_ms,
        })
    }

    /// Oldest first.
    pub fn list_comments(&self, post_id: i64, page: Page) -> Result<Vec<Comment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, post_id, owner_id, content, created_at_ms FROM comments
              WHERE post_id = ?1 ORDER BY created_at_ms, id
              LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![post_id, page.limit, page.offset], Comment::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// An existing like is `Conflict`.
    pub fn insert_like(&self, post_id: i64, user_id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO likes (post_id, user_id, created_at_ms) VALUES (?1, ?2, ?3)",
            params![post_id, user_id, now_ms()],
        )?;
        Ok(())
    }

    pub fn delete_like(&self, post_id: i64, user_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn.execute(
            "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
        )?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;
    use crate::test_support::{store, user};

    #[test]
    fn post_crud() {
        let store = store();
        let alice = user(&store, "alice@example.com");

        let post = store.insert_post(alice, "first").unwrap();
        assert_eq!(store.get_post(post.id).unwrap(), Some(post.clone()));

        let updated = store.update_post(post.id, "edited").unwrap().unwrap();
        assert_eq!(updated.content, "edited");
        assert_eq!(updated.created_at_ms, post.created_at_ms);
        assert_eq!(store.update_post(post.id + 100, "x").unwrap(), None);

        assert!(store.delete_post(post.id).unwrap());
        assert_eq!(store.get_post(post.id).unwrap(), None);
        assert!(!store.delete_post(post.id).unwrap());
    }

    #[test]
    fn listing_is_newest_first_and_paged() {
        let store = store();
        let alice = user(&store, "alice@example.com");
        let ids: Vec<i64> = (0..5)
            .map(|i| store.insert_post(alice, &format!("post {i}")).unwrap().id)
            .collect();

        let all = store.list_posts(PostScope::All, Page::default()).unwrap();
        let listed: Vec<i64> = all.iter().map(|p| p.id).collect();
        let mut expected = ids.clone();
        expected.reverse();
        assert_eq!(listed, expected);
        assert_eq!(all[0].owner_email, "alice@example.com");

        let page = store
            .list_posts(PostScope::All, Page::new(Some(2), Some(1)))
            .unwrap();
        assert_eq!(page.iter().map(|p| p.id).collect::<Vec<_>>(), vec![ids[3], ids[2]]);
    }

    #[test]
    fn scopes_filter_by_owner_and_follow_graph() {
        let store = store();
        let alice = user(&store, "alice@example.com");
        let bob = user(&store, "bob@example.com");
        let carol = user(&store, "carol@example.com");
        store.insert_post(alice, "a").unwrap();
        let b = store.insert_post(bob, "b").unwrap();
        store.insert_post(carol, "c").unwrap();
        store.insert_follow(alice, bob).unwrap();

        let mine = store.list_posts(PostScope::Owner(alice), Page::default()).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].content, "a");

        let feed = store
            .list_posts(PostScope::FollowedBy(alice), Page::default())
            .unwrap();
        assert_eq!(feed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![b.id]);

        let empty = store
            .list_posts(PostScope::FollowedBy(carol), Page::default())
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn stats_count_likes_and_comments() {
        let store = store();
        let alice = user(&store, "alice@example.com");
        let bob = user(&store, "bob@example.com");
        let post = store.insert_post(alice, "hello").unwrap();

        store.insert_like(post.id, alice).unwrap();
        store.insert_like(post.id, bob).unwrap();
        assert!(matches!(
            store.insert_like(post.id, bob),
            Err(StoreError::Conflict)
        ));
        store.insert_comment(post.id, bob, "first!").unwrap();
        store.insert_comment(post.id, alice, "thanks").unwrap();

        let stats = store.get_post_with_stats(post.id).unwrap().unwrap();
        assert_eq!(stats.likes_count, 2);
        assert_eq!(stats.comments_count, 2);
        assert_eq!(
            stats.comments.iter().map(|c| c.content.as_str()).collect::<Vec<_>>(),
            vec!["first!", "thanks"]
        );

        assert!(store.delete_like(post.id, bob).unwrap());
        assert!(!store.delete_like(post.id, bob).unwrap());
        let stats = store.get_post_with_stats(post.id).unwrap().unwrap();
        assert_eq!(stats.likes_count, 1);
    }

    #[test]
    fn comments_are_paged_oldest_first() {
        let store = store();
        let alice = user(&store, "alice@example.com");
        let post = store.insert_post(alice, "p").unwrap();
        for i in 0..4 {
            store.insert_comment(post.id, alice, &format!("c{i}")).unwrap();
        }
        let page = store.list_comments(post.id, Page::new(Some(2), Some(1))).unwrap();
        assert_eq!(
            page.iter().map(|c| c.content.as_str()).collect::<Vec<_>>(),
            vec!["c1", "c2"]
        );
    }

    #[test]
    fn deleting_post_removes_comments_and_likes() {
        let store = store();
        let alice = user(&store, "alice@example.com");
        let post = store.insert_post(alice, "p").unwrap();
        store.insert_comment(post.id, alice, "c").unwrap();
        store.insert_like(post.id, alice).unwrap();

        store.delete_post(post.id).unwrap();
        assert!(store.list_comments(post.id, Page::default()).unwrap().is_empty());
        assert!(!store.delete_like(post.id, alice).unwrap());
    }

    #[test]
    fn missing_post_has_no_stats() {
        let store = store();
        assert_eq!(store.get_post_with_stats(1).unwrap(), None);
    }
}
