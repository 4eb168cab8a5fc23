use crate::models::UserId;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{collection} {id} not found")]
    NotFound { collection: &'static str, id: String },

    #[error("Friend request from user {0} is already pending")]
    DuplicateRequest(UserId),

    #[error("A group needs at least 2 members besides the owner, got {0}")]
    GroupTooSmall(usize),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl CoreError {
    pub(crate) fn conversation_not_found(id: impl ToString) -> Self {
        CoreError::NotFound {
            collection: "conversation",
            id: id.to_string(),
        }
    }

    pub(crate) fn request_not_found(id: impl ToString) -> Self {
        CoreError::NotFound {
            collection: "friend request",
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}
