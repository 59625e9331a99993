use crate::{CoreError, Result, Rookery};
use rookery_store::{Notification, NotificationKind, Page};

impl Rookery {
    /// Persist a notification for `user_id`. Failure is logged, never
    /// propagated: the action that triggered it has already been stored.
    pub(crate) fn notify(&self, user_id: i64, kind: NotificationKind, message: &str) {
        if let Err(e) = self.store().insert_notification(user_id, kind, message) {
            tracing::warn!(user_id, kind = %kind, err = %e, "failed to store notification");
        }
    }

    /// Newest first.
    pub fn list_notifications(&self, user_id: i64, page: Page) -> Result<Vec<Notification>> {
        Ok(self.store().list_notifications(user_id, page)?)
    }

    /// Mark one of the caller's own notifications read. Someone else's id
    /// is indistinguishable from a missing one.
    pub fn mark_notification_read(&self, user_id: i64, notification_id: i64) -> Result<()> {
        if !self
            .store()
            .mark_notification_read(notification_id, user_id)?
        {
            return Err(CoreError::NotificationNotFound);
        }
        Ok(())
    }

    /// Returns how many were flipped.
    pub fn mark_all_notifications_read(&self, user_id: i64) -> Result<usize> {
        Ok(self.store().mark_all_notifications_read(user_id)?)
    }
}
