use std::collections::BTreeSet;

use chrono::Utc;

use crate::error::CoreError;
use crate::models::{Conversation, ConversationId, IncomingMessage, LastMessage, UserId};

/// Sub-store for the owner's conversations and which one is in the foreground.
pub struct ConversationRegistry {
    owner_id: UserId,
    /// Most recently created first
    conversations: Vec<Conversation>,
    /// In-memory only, never persisted
    open_id: Option<ConversationId>,
}

impl ConversationRegistry {
    pub fn new(owner_id: UserId) -> Self {
        Self {
            owner_id,
            conversations: Vec::new(),
            open_id: None,
        }
    }

    pub fn from_conversations(owner_id: UserId, conversations: Vec<Conversation>) -> Self {
        Self {
            owner_id,
            conversations,
            open_id: None,
        }
    }

    pub fn clear(&mut self) {
        self.conversations.clear();
        self.open_id = None;
    }

    // ===== Getters =====

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn get(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn open_conversation(&self) -> Option<ConversationId> {
        self.open_id
    }

    pub fn is_open(&self, id: ConversationId) -> bool {
        self.open_id == Some(id)
    }

    pub fn unread_total(&self) -> usize {
        self.conversations
            .iter()
            .map(|c| c.unread_count as usize)
            .sum()
    }

    pub fn find_direct(&self, other: UserId) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|c| c.is_direct_with(self.owner_id, other))
    }

    // ===== Mutations =====

    /// Existing direct thread with `other`, or a fresh one. The flag is true
    /// when a conversation was created.
    pub fn find_or_create_direct(&mut self, other: UserId) -> (ConversationId, bool) {
        if let Some(existing) = self.find_direct(other) {
            return (existing.id, false);
        }
        let id = self.next_id();
        self.conversations
            .insert(0, Conversation::direct(id, self.owner_id, other));
        (id, true)
    }

    /// New group thread. The owner is always a participant and at least two
    /// other distinct members are required; two-party threads are direct.
    pub fn create_group(
        &mut self,
        name: impl Into<String>,
        participants: impl IntoIterator<Item = UserId>,
    ) -> Result<ConversationId, CoreError> {
        let owner_id = self.owner_id;
        let others: BTreeSet<UserId> = participants
            .into_iter()
            .filter(|p| *p != owner_id)
            .collect();
        if others.len() < 2 {
            return Err(CoreError::GroupTooSmall(others.len()));
        }
        let id = self.next_id();
        let members = others.into_iter().chain(std::iter::once(owner_id));
        self.conversations
            .insert(0, Conversation::group(id, name, members));
        Ok(id)
    }

    /// Record an incoming message. Counts as unread unless the conversation
    /// is the open one. Returns the conversation's unread count afterwards.
    pub fn deliver_incoming(
        &mut self,
        id: ConversationId,
        message: IncomingMessage,
    ) -> Result<u32, CoreError> {
        let is_open = self.is_open(id);
        let conversation = self.get_mut(id)?;
        conversation.last_message = Some(LastMessage {
            text: message.text,
            sender_id: message.sender_id,
            at: message.at,
            read_by_owner: is_open,
        });
        if !is_open {
            conversation.unread_count = conversation.unread_count.saturating_add(1);
        }
        Ok(conversation.unread_count)
    }

    /// Record a message the owner sent. Replying implies everything before
    /// it has been seen.
    pub fn send_outgoing(&mut self, id: ConversationId, text: impl Into<String>) -> Result<(), CoreError> {
        let owner_id = self.owner_id;
        let conversation = self.get_mut(id)?;
        conversation.last_message = Some(LastMessage {
            text: text.into(),
            sender_id: owner_id,
            at: Utc::now(),
            read_by_owner: true,
        });
        conversation.unread_count = 0;
        Ok(())
    }

    /// Bring a conversation to the foreground and zero its unread count.
    /// Opening the already-open conversation just re-zeroes. Returns how many
    /// unread messages were cleared.
    pub fn open(&mut self, id: ConversationId) -> Result<u32, CoreError> {
        let conversation = self.get_mut(id)?;
        let cleared = std::mem::take(&mut conversation.unread_count);
        if let Some(last) = conversation.last_message.as_mut() {
            last.read_by_owner = true;
        }
        self.open_id = Some(id);
        Ok(cleared)
    }

    /// Clear the foreground marker if `id` holds it. Never restores unread counts.
    pub fn close(&mut self, id: ConversationId) -> Result<(), CoreError> {
        if self.get(id).is_none() {
            return Err(CoreError::conversation_not_found(id));
        }
        if self.open_id == Some(id) {
            self.open_id = None;
        }
        Ok(())
    }

    pub fn delete(&mut self, id: ConversationId) -> Result<Conversation, CoreError> {
        let index = self
            .conversations
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CoreError::conversation_not_found(id))?;
        if self.open_id == Some(id) {
            self.open_id = None;
        }
        Ok(self.conversations.remove(index))
    }

    /// Zero every unread count and mark each last message as seen, the same
    /// end state as opening every conversation. Returns how many unread
    /// messages were cleared.
    pub fn mark_all_read(&mut self) -> usize {
        let mut cleared = 0usize;
        for conversation in &mut self.conversations {
            cleared += std::mem::take(&mut conversation.unread_count) as usize;
            if let Some(last) = conversation.last_message.as_mut() {
                last.read_by_owner = true;
            }
        }
        cleared
    }

    /// Returns the new muted state.
    pub fn toggle_mute(&mut self, id: ConversationId) -> Result<bool, CoreError> {
        let conversation = self.get_mut(id)?;
        conversation.muted = !conversation.muted;
        Ok(conversation.muted)
    }

    fn get_mut(&mut self, id: ConversationId) -> Result<&mut Conversation, CoreError> {
        self.conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CoreError::conversation_not_found(id))
    }

    // Never reuses the id of a deleted conversation
    fn next_id(&self) -> ConversationId {
        self.conversations.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConversationKind;

    const OWNER: UserId = 1;

    fn incoming(from: UserId, text: &str) -> IncomingMessage {
        IncomingMessage::new(from, text)
    }

    #[test]
    fn test_find_or_create_direct_reuses_existing() {
        let mut registry = ConversationRegistry::new(OWNER);
        let (first, created) = registry.find_or_create_direct(2);
        assert!(created);
        let (again, created) = registry.find_or_create_direct(2);
        assert!(!created);
        assert_eq!(first, again);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(first).unwrap().unread_count, 0);
    }

    #[test]
    fn test_find_or_create_direct_skips_groups() {
        let mut registry = ConversationRegistry::new(OWNER);
        let group = registry.create_group("Trio", [2, 3]).unwrap();
        assert_eq!(registry.get(group).unwrap().kind, ConversationKind::Group);

        let (direct, created) = registry.find_or_create_direct(2);
        assert!(created);
        assert_ne!(direct, group);
    }

    #[test]
    fn test_find_direct_matches_reversed_participants() {
        let snapshot = Conversation {
            participant_ids: [2, OWNER].into_iter().collect(),
            ..Conversation::direct(9, OWNER, 2)
        };
        let mut registry = ConversationRegistry::from_conversations(OWNER, vec![snapshot]);
        assert_eq!(registry.find_or_create_direct(2), (9, false));
    }

    #[test]
    fn test_deliver_while_closed_counts_unread() {
        let mut registry = ConversationRegistry::new(OWNER);
        let (id, _) = registry.find_or_create_direct(2);
        assert_eq!(registry.deliver_incoming(id, incoming(2, "hi")).unwrap(), 1);
        assert_eq!(registry.deliver_incoming(id, incoming(2, "there")).unwrap(), 2);

        let last = registry.get(id).unwrap().last_message.clone().unwrap();
        assert_eq!(last.text, "there");
        assert!(!last.read_by_owner);
    }

    #[test]
    fn test_deliver_while_open_stays_read() {
        let mut registry = ConversationRegistry::new(OWNER);
        let (id, _) = registry.find_or_create_direct(2);
        registry.open(id).unwrap();
        assert_eq!(registry.deliver_incoming(id, incoming(2, "hi")).unwrap(), 0);
        assert!(registry.get(id).unwrap().last_message.as_ref().unwrap().read_by_owner);

        registry.close(id).unwrap();
        assert_eq!(registry.deliver_incoming(id, incoming(2, "later")).unwrap(), 1);
    }

    #[test]
    fn test_open_zeroes_and_is_reentrant() {
        let mut registry = ConversationRegistry::new(OWNER);
        let (id, _) = registry.find_or_create_direct(2);
        registry.deliver_incoming(id, incoming(2, "a")).unwrap();
        registry.deliver_incoming(id, incoming(2, "b")).unwrap();

        assert_eq!(registry.open(id).unwrap(), 2);
        assert_eq!(registry.open(id).unwrap(), 0);
        assert_eq!(registry.open_conversation(), Some(id));
        assert_eq!(registry.unread_total(), 0);
    }

    #[test]
    fn test_close_does_not_resurrect_unread() {
        let mut registry = ConversationRegistry::new(OWNER);
        let (id, _) = registry.find_or_create_direct(2);
        registry.deliver_incoming(id, incoming(2, "a")).unwrap();
        registry.open(id).unwrap();
        registry.close(id).unwrap();
        assert_eq!(registry.get(id).unwrap().unread_count, 0);
        assert_eq!(registry.open_conversation(), None);
    }

    #[test]
    fn test_close_other_conversation_keeps_marker() {
        let mut registry = ConversationRegistry::new(OWNER);
        let (a, _) = registry.find_or_create_direct(2);
        let (b, _) = registry.find_or_create_direct(3);
        registry.open(a).unwrap();
        registry.close(b).unwrap();
        assert_eq!(registry.open_conversation(), Some(a));
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let mut registry = ConversationRegistry::new(OWNER);
        assert!(registry.open(42).unwrap_err().is_not_found());
        assert!(registry.close(42).unwrap_err().is_not_found());
        assert!(registry.delete(42).unwrap_err().is_not_found());
        assert!(registry
            .deliver_incoming(42, incoming(2, "x"))
            .unwrap_err()
            .is_not_found());
        assert!(registry.toggle_mute(42).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_removes_unread_and_open_marker() {
        let mut registry = ConversationRegistry::new(OWNER);
        let (a, _) = registry.find_or_create_direct(2);
        let (b, _) = registry.find_or_create_direct(3);
        registry.deliver_incoming(a, incoming(2, "x")).unwrap();
        registry.deliver_incoming(b, incoming(3, "y")).unwrap();
        registry.deliver_incoming(b, incoming(3, "z")).unwrap();
        registry.open(a).unwrap();

        let removed = registry.delete(b).unwrap();
        assert_eq!(removed.unread_count, 2);
        assert_eq!(registry.unread_total(), 0);

        registry.delete(a).unwrap();
        assert_eq!(registry.open_conversation(), None);
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let mut registry = ConversationRegistry::new(OWNER);
        let (a, _) = registry.find_or_create_direct(2);
        let (b, _) = registry.find_or_create_direct(3);
        registry.delete(a).unwrap();
        let (c, _) = registry.find_or_create_direct(4);
        assert_ne!(c, b);
    }

    #[test]
    fn test_send_outgoing_clears_unread() {
        let mut registry = ConversationRegistry::new(OWNER);
        let (id, _) = registry.find_or_create_direct(2);
        registry.deliver_incoming(id, incoming(2, "ping")).unwrap();
        registry.send_outgoing(id, "pong").unwrap();
        let conversation = registry.get(id).unwrap();
        assert_eq!(conversation.unread_count, 0);
        assert_eq!(conversation.last_message.as_ref().unwrap().sender_id, OWNER);
    }

    #[test]
    fn test_mark_all_read_and_mute() {
        let mut registry = ConversationRegistry::new(OWNER);
        let (a, _) = registry.find_or_create_direct(2);
        let group = registry.create_group("Weekend Warriors", [2, 3, 4]).unwrap();
        registry.deliver_incoming(a, incoming(2, "x")).unwrap();
        registry.deliver_incoming(group, incoming(3, "y")).unwrap();
        assert!(registry.get(group).unwrap().participant_ids.contains(&OWNER));

        assert_eq!(registry.mark_all_read(), 2);
        assert_eq!(registry.unread_total(), 0);
        assert!(registry.toggle_mute(group).unwrap());
        assert!(!registry.toggle_mute(group).unwrap());
    }

    #[test]
    fn test_group_needs_two_other_members() {
        let mut registry = ConversationRegistry::new(OWNER);
        let err = registry.create_group("Pair", [2]).unwrap_err();
        assert!(matches!(err, CoreError::GroupTooSmall(1)));
        // The owner and repeated ids do not count towards the minimum
        assert!(matches!(
            registry.create_group("Echo", [OWNER, 2, 2]),
            Err(CoreError::GroupTooSmall(1))
        ));
        assert!(registry.is_empty());

        let id = registry.create_group("Trio", [2, 3]).unwrap();
        assert_eq!(registry.get(id).unwrap().participant_ids.len(), 3);
    }

    #[test]
    fn test_mark_all_read_marks_last_messages_seen() {
        let mut registry = ConversationRegistry::new(OWNER);
        let (id, _) = registry.find_or_create_direct(2);
        registry.deliver_incoming(id, incoming(2, "hello")).unwrap();
        registry.mark_all_read();
        let conversation = registry.get(id).unwrap();
        assert_eq!(conversation.unread_count, 0);
        assert!(conversation.last_message.as_ref().unwrap().read_by_owner);
    }
}
