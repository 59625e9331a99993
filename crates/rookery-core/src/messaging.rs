use crate::{CoreError, Endpoint, Result, Rookery};
use rookery_store::{Conversation, NotificationKind, Page, StoreError, StoredMessage};
use serde::Serialize;

/// Shown in place of a message body that fails to decrypt.
pub const UNREADABLE: &str = "[unreadable]";

pub const MAX_MESSAGE_CHARS: usize = 4000;
pub const DEFAULT_MESSAGE_PAGE_LIMIT: u32 = 50;

/// After a conflicting insert the winner's row must be readable. If it is
/// not, the store is inconsistent and the conflict is surfaced as is.
fn adopt_after_conflict(found: Option<Conversation>) -> Result<Conversation> {
    match found {
        Some(conv) => {
            tracing::debug!(conversation_id = conv.id, "conversation insert lost race, reusing row");
            Ok(conv)
        }
        None => {
            tracing::warn!("conversation insert conflicted but no row was found");
            Err(CoreError::Store(StoreError::Conflict))
        }
    }
}

/// A message as a participant sees it: plaintext body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageView {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at_ms: i64,
    pub is_read: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    /// Unread messages for the viewer who listed it.
    pub unread_count: u64,
}

impl Rookery {
    /// Return the conversation between `initiator_id` and `target_id`,
    /// creating it on first use. The two must follow each other.
    pub fn get_or_create_conversation(
        &self,
        initiator_id: i64,
        target_id: i64,
    ) -> Result<Conversation> {
        self.admit(&initiator_id.to_string(), Endpoint::Conversation)?;

        if initiator_id == target_id {
            return Err(CoreError::SelfConversation);
        }
        if !self.store().user_exists(target_id)? {
            return Err(CoreError::TargetNotFound);
        }
        if !self.store().is_mutual_follow(initiator_id, target_id)? {
            return Err(CoreError::FollowRequirementNotMet);
        }

        if let Some(conv) = self.store().find_conversation(initiator_id, target_id)? {
            return Ok(conv);
        }
        self.insert_or_adopt_conversation(initiator_id, target_id)
    }

    /// Insert the pair's conversation. If a concurrent caller inserted it
    /// first, return their row instead.
    pub(crate) fn insert_or_adopt_conversation(&self, a: i64, b: i64) -> Result<Conversation> {
        match self.store().insert_conversation(a, b) {
            Ok(conv) => {
                tracing::info!(
                    conversation_id = conv.id,
                    user1_id = conv.user1_id,
                    user2_id = conv.user2_id,
                    "conversation created"
                );
                Ok(conv)
            }
            Err(StoreError::Conflict) => adopt_after_conflict(self.store().find_conversation(a, b)?),
            Err(e) => Err(e.into()),
        }
    }

    /// Conversations `viewer_id` takes part in, newest first, with the
    /// viewer's unread count for each.
    pub fn list_conversations(&self, viewer_id: i64, page: Page) -> Result<Vec<ConversationSummary>> {
        self.store()
            .list_conversations(viewer_id, page)?
            .into_iter()
            .map(|conversation| -> Result<ConversationSummary> {
                let unread_count = self.store().unread_count(conversation.id, viewer_id)?;
                Ok(ConversationSummary {
                    conversation,
                    unread_count,
                })
            })
            .collect()
    }

    fn participant_conversation(&self, conversation_id: i64, user_id: i64) -> Result<Conversation> {
        let conv = self
            .store()
            .get_conversation(conversation_id)?
            .ok_or(CoreError::ConversationNotFound)?;
        if !conv.has_participant(user_id) {
            return Err(CoreError::NotParticipant);
        }
        Ok(conv)
    }

    /// Seal and store a message, then notify the other participant.
    ///
    /// The response echoes the submitted plaintext; the stored payload is
    /// not read back.
    pub fn send_message(
        &self,
        conversation_id: i64,
        sender_id: i64,
        plaintext: &str,
    ) -> Result<MessageView> {
        let conv = self.participant_conversation(conversation_id, sender_id)?;
        // Any text is a valid body, including an empty one; only the size is capped.
        if plaintext.chars().count() > MAX_MESSAGE_CHARS {
            return Err(CoreError::InvalidInput(format!(
                "message must be {MAX_MESSAGE_CHARS} characters or less"
            )));
        }
        self.admit(&sender_id.to_string(), Endpoint::SendMessage)?;

        let sealed = self.cipher.encrypt(plaintext)?;
        let stored = self
            .store()
            .insert_message(conversation_id, sender_id, &sealed)?;

        let recipient_id = conv.other_participant(sender_id);
        self.notify(
            recipient_id,
            NotificationKind::Message,
            &format!("New message in conversation {conversation_id}"),
        );
        tracing::debug!(conversation_id, message_id = stored.id, sender_id, "message sent");

        Ok(MessageView {
            id: stored.id,
            conversation_id,
            sender_id,
            content: plaintext.to_string(),
            created_at_ms: stored.created_at_ms,
            is_read: stored.is_read,
        })
    }

    /// Oldest first. A payload that fails to open is shown as [`UNREADABLE`].
    pub fn list_messages(
        &self,
        conversation_id: i64,
        viewer_id: i64,
        page: Page,
    ) -> Result<Vec<MessageView>> {
        self.participant_conversation(conversation_id, viewer_id)?;
        let stored = self.store().list_messages(conversation_id, page)?;
        Ok(stored.into_iter().map(|m| self.open_message(m)).collect())
    }

    fn open_message(&self, m: StoredMessage) -> MessageView {
        let content = match self.cipher.decrypt(&m.ciphertext) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(message_id = m.id, conversation_id = m.conversation_id, err = %e, "failed to decrypt message");
                UNREADABLE.to_string()
            }
        };
        MessageView {
            id: m.id,
            conversation_id: m.conversation_id,
            sender_id: m.sender_id,
            content,
            created_at_ms: m.created_at_ms,
            is_read: m.is_read,
        }
    }

    /// Messages in the conversation that `viewer_id` did not send and has not read.
    pub fn unread_count(&self, conversation_id: i64, viewer_id: i64) -> Result<u64> {
        self.participant_conversation(conversation_id, viewer_id)?;
        Ok(self.store().unread_count(conversation_id, viewer_id)?)
    }

    /// Mark everything `viewer_id` received in the conversation as read.
    /// Returns how many messages changed.
    pub fn mark_read(&self, conversation_id: i64, viewer_id: i64) -> Result<usize> {
        self.participant_conversation(conversation_id, viewer_id)?;
        let n = self.store().mark_read(conversation_id, viewer_id)?;
        if n > 0 {
            tracing::debug!(conversation_id, viewer_id, marked = n, "messages marked read");
        }
        Ok(n)
    }
}
