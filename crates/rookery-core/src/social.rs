use crate::{CoreError, Result, Rookery};
use rookery_store::{NotificationKind, StoreError, UserSummary};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowStatus {
    Followed,
    Unfollowed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: UserSummary,
    pub followers_count: usize,
    pub following_count: usize,
    pub followers: Vec<UserSummary>,
    pub following: Vec<UserSummary>,
}

impl Rookery {
    /// Follow `target_id`, or unfollow if already following.
    pub fn toggle_follow(&self, current_id: i64, target_id: i64) -> Result<FollowStatus> {
        if current_id == target_id {
            return Err(CoreError::SelfFollow);
        }
        if !self.store().user_exists(target_id)? {
            return Err(CoreError::UserNotFound);
        }

        if self.store().delete_follow(current_id, target_id)? {
            tracing::debug!(follower = current_id, following = target_id, "unfollowed");
            return Ok(FollowStatus::Unfollowed);
        }

        match self.store().insert_follow(current_id, target_id) {
            Ok(()) => {}
            // A concurrent toggle got there first; the edge exists either way.
            Err(StoreError::Conflict) => return Ok(FollowStatus::Followed),
            Err(e) => return Err(e.into()),
        }
        tracing::debug!(follower = current_id, following = target_id, "followed");

        self.notify(
            target_id,
            NotificationKind::Follow,
            &format!("{current_id} started following you"),
        );
        Ok(FollowStatus::Followed)
    }

    pub fn profile(&self, user_id: i64) -> Result<Profile> {
        let Some(user) = self.store().get_user(user_id)? else {
            return Err(CoreError::UserNotFound);
        };
        let followers = self.store().followers(user_id)?;
        let following = self.store().following(user_id)?;
        Ok(Profile {
            user: user.summary(),
            followers_count: followers.len(),
            following_count: following.len(),
            followers,
            following,
        })
    }
}
