use crate::{CoreError, Endpoint, Result, Rookery, validate_text};
use rookery_store::{Comment, NotificationKind, Page, Post, PostScope, PostWithStats, StoreError};
use serde::Serialize;

pub const MAX_POST_CHARS: usize = 5000;
pub const MAX_COMMENT_CHARS: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeStatus {
    Liked,
    Unliked,
}

impl Rookery {
    pub fn create_post(&self, owner_id: i64, content: &str) -> Result<Post> {
        self.admit(&owner_id.to_string(), Endpoint::CreatePost)?;
        validate_text("content", content, MAX_POST_CHARS)?;
        let post = self.store().insert_post(owner_id, content)?;
        tracing::debug!(post_id = post.id, owner_id, "post created");
        Ok(post)
    }

    /// Every post, newest first.
    pub fn list_posts(&self, page: Page) -> Result<Vec<PostWithStats>> {
        Ok(self.store().list_posts(PostScope::All, page)?)
    }

    /// Posts by users `user_id` follows, newest first.
    pub fn feed(&self, user_id: i64, page: Page) -> Result<Vec<PostWithStats>> {
        Ok(self.store().list_posts(PostScope::FollowedBy(user_id), page)?)
    }

    /// Posts written by `owner_id`, newest first. An unknown user has none.
    pub fn user_posts(&self, owner_id: i64, page: Page) -> Result<Vec<PostWithStats>> {
        Ok(self.store().list_posts(PostScope::Owner(owner_id), page)?)
    }

    pub fn get_post(&self, post_id: i64) -> Result<PostWithStats> {
        self.store()
            .get_post_with_stats(post_id)?
            .ok_or(CoreError::PostNotFound)
    }

    pub fn update_post(&self, user_id: i64, post_id: i64, content: &str) -> Result<Post> {
        self.owned_post(user_id, post_id)?;
        validate_text("content", content, MAX_POST_CHARS)?;
        self.store()
            .update_post(post_id, content)?
            .ok_or(CoreError::PostNotFound)
    }

    pub fn delete_post(&self, user_id: i64, post_id: i64) -> Result<()> {
        self.owned_post(user_id, post_id)?;
        if !self.store().delete_post(post_id)? {
            return Err(CoreError::PostNotFound);
        }
        tracing::debug!(post_id, user_id, "post deleted");
        Ok(())
    }

    fn owned_post(&self, user_id: i64, post_id: i64) -> Result<Post> {
        let post = self
            .store()
            .get_post(post_id)?
            .ok_or(CoreError::PostNotFound)?;
        if post.owner_id != user_id {
            return Err(CoreError::NotOwner);
        }
        Ok(post)
    }

    pub fn create_comment(&self, user_id: i64, post_id: i64, content: &str) -> Result<Comment> {
        self.admit(&user_id.to_string(), Endpoint::CreateComment)?;
        let post = self
            .store()
            .get_post(post_id)?
            .ok_or(CoreError::PostNotFound)?;
        validate_text("content", content, MAX_COMMENT_CHARS)?;

        let comment = self.store().insert_comment(post_id, user_id, content)?;
        if post.owner_id != user_id {
            self.notify(
                post.owner_id,
                NotificationKind::Comment,
                &format!("New comment on your post (id={post_id})"),
            );
        }
        Ok(comment)
    }

    /// Oldest first. An unknown post has no comments.
    pub fn list_comments(&self, post_id: i64, page: Page) -> Result<Vec<Comment>> {
        Ok(self.store().list_comments(post_id, page)?)
    }

    /// Like `post_id`, or remove the like if present.
    pub fn toggle_like(&self, user_id: i64, post_id: i64) -> Result<LikeStatus> {
        let post = self
            .store()
            .get_post(post_id)?
            .ok_or(CoreError::PostNotFound)?;

        if self.store().delete_like(post_id, user_id)? {
            return Ok(LikeStatus::Unliked);
        }
        match self.store().insert_like(post_id, user_id) {
            Ok(()) => {}
            Err(StoreError::Conflict) => return Ok(LikeStatus::Liked),
            Err(e) => return Err(e.into()),
        }

        if post.owner_id != user_id {
            self.notify(
                post.owner_id,
                NotificationKind::Like,
                &format!("Your post (id={post_id}) got a new like"),
            );
        }
        Ok(LikeStatus::Liked)
    }
}
