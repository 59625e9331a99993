use crate::{Result, Store, UserSummary};
use rookery_crypto::time::now_ms;
use rusqlite::params;

impl Store {
    /// Record that `follower_id` follows `following_id`. An existing edge is `Conflict`.
    pub fn insert_follow(&self, follower_id: i64, following_id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO follows (follower_id, following_id, created_at_ms) VALUES (?1, ?2, ?3)",
            params![follower_id, following_id, now_ms()],
        )?;
        Ok(())
    }

    /// Returns whether an edge was removed.
    pub fn delete_follow(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn.execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
            params![follower_id, following_id],
        )?;
        Ok(n > 0)
    }

    pub fn is_following(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2)",
            params![follower_id, following_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Both directed edges exist, read in one statement.
    pub fn is_mutual_follow(&self, a: i64, b: i64) -> Result<bool> {
        let conn = self.conn()?;
        let edges: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows
              WHERE (follower_id = ?1 AND following_id = ?2)
                 OR (follower_id = ?2 AND following_id = ?1)",
            params![a, b],
            |row| row.get(0),
        )?;
        Ok(a != b && edges == 2)
    }

    /// Users following `user_id`, oldest edge first.
    pub fn followers(&self, user_id: i64) -> Result<Vec<UserSummary>> {
        self.follow_list(
            "SELECT u.id, u.email FROM follows f JOIN users u ON u.id = f.follower_id
              WHERE f.following_id = ?1 ORDER BY f.created_at_ms, f.id",
            user_id,
        )
    }

    /// Users `user_id` follows, oldest edge first.
    pub fn following(&self, user_id: i64) -> Result<Vec<UserSummary>> {
        self.follow_list(
            "SELECT u.id, u.email FROM follows f JOIN users u ON u.id = f.following_id
              WHERE f.follower_id = ?1 ORDER BY f.created_at_ms, f.id",
            user_id,
        )
    }

    fn follow_list(&self, sql: &str, user_id: i64) -> Result<Vec<UserSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([user_id], |row| {
            Ok(UserSummary {
                id: row.get(0)?,
                email: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use crate::StoreError;
    use crate::test_support::{store, user};

    #[test]
    fn follow_and_unfollow() {
        let store = store();
        let alice = user(&store, "alice@example.com");
        let bob = user(&store, "bob@example.com");

        store.insert_follow(alice, bob).unwrap();
        assert!(store.is_following(alice, bob).unwrap());
        assert!(!store.is_following(bob, alice).unwrap());

        assert!(matches!(
            store.insert_follow(alice, bob),
            Err(StoreError::Conflict)
        ));

        assert!(store.delete_follow(alice, bob).unwrap());
        assert!(!store.delete_follow(alice, bob).unwrap());
        assert!(!store.is_following(alice, bob).unwrap());
    }

    #[test]
    fn mutual_follow_needs_both_edges() {
        let store = store();
        let alice = user(&store, "alice@example.com");
        let bob = user(&store, "bob@example.com");
        let carol = user(&store, "carol@example.com");

        store.insert_follow(alice, bob).unwrap();
        assert!(!store.is_mutual_follow(alice, bob).unwrap());

        store.insert_follow(bob, alice).unwrap();
        assert!(store.is_mutual_follow(alice, bob).unwrap());
        assert!(store.is_mutual_follow(bob, alice).unwrap());

        // Unrelated edges don't count toward the pair.
        store.insert_follow(carol, alice).unwrap();
        store.insert_follow(alice, carol).unwrap();
        store.delete_follow(bob, alice).unwrap();
        assert!(!store.is_mutual_follow(alice, bob).unwrap());
    }

    #[test]
    fn follower_and_following_lists() {
        let store = store();
        let alice = user(&store, "alice@example.com");
        let bob = user(&store, "bob@example.com");
        let carol = user(&store, "carol@example.com");

        store.insert_follow(bob, alice).unwrap();
        store.insert_follow(carol, alice).unwrap();
        store.insert_follow(alice, carol).unwrap();

        let followers: Vec<_> = store.followers(alice).unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(followers, vec![bob, carol]);
        let following = store.following(alice).unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].email, "carol@example.com");
    }
}
