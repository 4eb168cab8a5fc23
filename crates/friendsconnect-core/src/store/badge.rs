use crate::models::AggregateBadgeState;

use super::{ConversationRegistry, FriendRequestQueue, NotificationLedger};

/// Read-only view that folds the three producers into badge counts.
///
/// Nothing is cached: every call walks the current collections, so the
/// result can never drift from them.
pub struct BadgeAggregator;

impl BadgeAggregator {
    pub fn recompute(
        ledger: &NotificationLedger,
        conversations: &ConversationRegistry,
        requests: &FriendRequestQueue,
    ) -> AggregateBadgeState {
        AggregateBadgeState {
            notifications_unread: ledger.records().filter(|r| !r.read).count(),
            messages_unread: conversations
                .conversations()
                .iter()
                .map(|c| c.unread_count as usize)
                .sum(),
            friend_requests_pending: requests.pending_count(),
        }
    }
}
