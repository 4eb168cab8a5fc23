pub mod badge;
pub mod conversation;
pub mod friend_request;
pub mod notification;

pub use badge::{badge_label, AggregateBadgeState};
pub use conversation::{
    Conversation, ConversationId, ConversationKind, IncomingMessage, LastMessage, UserId,
};
pub use friend_request::FriendRequest;
pub use notification::{generate_notification_id, NotificationKind, NotificationRecord};
