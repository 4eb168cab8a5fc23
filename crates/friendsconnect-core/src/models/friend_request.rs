use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Pending inbound friend request, keyed by the requesting user's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: UserId,
    pub name: String,
    #[serde(default, alias = "mutual")]
    pub mutual_count: u32,
    pub received_at: DateTime<Utc>,
}

impl FriendRequest {
    pub fn new(id: UserId, name: impl Into<String>, mutual_count: u32) -> Self {
        Self {
            id,
            name: name.into(),
            mutual_count,
            received_at: Utc::now(),
        }
    }
}
