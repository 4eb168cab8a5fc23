use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type UserId = u64;
pub type ConversationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    /// Two-party thread
    Direct,
    /// Three or more participants
    Group,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub text: String,
    pub sender_id: UserId,
    pub at: DateTime<Utc>,
    pub read_by_owner: bool,
}

/// A message arriving from another participant.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub sender_id: UserId,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(sender_id: UserId, text: impl Into<String>) -> Self {
        Self {
            sender_id,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub kind: ConversationKind,
    /// Display name, only set for groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub participant_ids: BTreeSet<UserId>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    #[serde(default)]
    pub muted: bool,
}

impl Conversation {
    pub fn direct(id: ConversationId, owner: UserId, other: UserId) -> Self {
        Self {
            id,
            kind: ConversationKind::Direct,
            name: None,
            participant_ids: [owner, other].into_iter().collect(),
            unread_count: 0,
            last_message: None,
            muted: false,
        }
    }

    pub fn group(
        id: ConversationId,
        name: impl Into<String>,
        participants: impl IntoIterator<Item = UserId>,
    ) -> Self {
        Self {
            id,
            kind: ConversationKind::Group,
            name: Some(name.into()),
            participant_ids: participants.into_iter().collect(),
            unread_count: 0,
            last_message: None,
            muted: false,
        }
    }

    pub fn is_direct(&self) -> bool {
        self.kind == ConversationKind::Direct
    }

    /// True for the direct thread between exactly `owner` and `other`,
    /// regardless of the order participants were recorded in.
    pub fn is_direct_with(&self, owner: UserId, other: UserId) -> bool {
        if !self.is_direct() {
            return false;
        }
        let expected: BTreeSet<UserId> = [owner, other].into_iter().collect();
        self.participant_ids == expected
    }

    /// The other side of a direct conversation.
    pub fn counterpart(&self, owner: UserId) -> Option<UserId> {
        if !self.is_direct() {
            return None;
        }
        self.participant_ids.iter().copied().find(|id| *id != owner)
    }

    pub fn has_unread(&self) -> bool {
        self.unread_count > 0
    }
}
