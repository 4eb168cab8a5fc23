use std::collections::HashMap;

use crate::error::CoreError;
use crate::models::{FriendRequest, UserId};

/// Sub-store for pending inbound friend requests.
///
/// Accept and decline both remove the entry, so each request reaches
/// exactly one terminal outcome.
#[derive(Debug, Default)]
pub struct FriendRequestQueue {
    pending: HashMap<UserId, FriendRequest>,
}

impl FriendRequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later duplicates in a persisted snapshot are ignored.
    pub fn from_requests(requests: Vec<FriendRequest>) -> Self {
        let mut queue = Self::new();
        for request in requests {
            queue.pending.entry(request.id).or_insert(request);
        }
        queue
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    // ===== Query Methods =====

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn get(&self, id: UserId) -> Option<&FriendRequest> {
        self.pending.get(&id)
    }

    /// Most recently received first
    pub fn pending(&self) -> Vec<&FriendRequest> {
        let mut requests: Vec<&FriendRequest> = self.pending.values().collect();
        requests.sort_by(|a, b| b.received_at.cmp(&a.received_at).then(a.id.cmp(&b.id)));
        requests
    }

    pub fn snapshot(&self) -> Vec<FriendRequest> {
        self.pending().into_iter().cloned().collect()
    }

    // ===== Mutation Methods =====

    pub fn enqueue(&mut self, request: FriendRequest) -> Result<(), CoreError> {
        if self.pending.contains_key(&request.id) {
            return Err(CoreError::DuplicateRequest(request.id));
        }
        self.pending.insert(request.id, request);
        Ok(())
    }

    pub fn accept(&mut self, id: UserId) -> Result<FriendRequest, CoreError> {
        self.take(id)
    }

    pub fn decline(&mut self, id: UserId) -> Result<FriendRequest, CoreError> {
        self.take(id)
    }

    fn take(&mut self, id: UserId) -> Result<FriendRequest, CoreError> {
        self.pending
            .remove(&id)
            .ok_or_else(|| CoreError::request_not_found(id))
    }
}
