use serde::Serialize;

use crate::constants::BADGE_OVERFLOW;

/// Unread counts shown on the notification, message and friend-request badges.
///
/// Always derived from the collections, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateBadgeState {
    pub notifications_unread: usize,
    pub messages_unread: usize,
    pub friend_requests_pending: usize,
}

impl AggregateBadgeState {
    pub fn total(&self) -> usize {
        self.notifications_unread + self.messages_unread + self.friend_requests_pending
    }

    pub fn is_clear(&self) -> bool {
        self.total() == 0
    }
}

/// Text for a badge showing `count`, or `None` when the badge is hidden.
pub fn badge_label(count: usize) -> Option<String> {
    match count {
        0 => None,
        n if n > BADGE_OVERFLOW => Some(format!("{}+", BADGE_OVERFLOW)),
        n => Some(n.to_string()),
    }
}
