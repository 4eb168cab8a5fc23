use std::rc::Rc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::CoreConfig;
use crate::constants::keys;
use crate::error::CoreError;
use crate::models::{
    AggregateBadgeState, Conversation, ConversationId, FriendRequest, IncomingMessage,
    NotificationKind, NotificationRecord, UserId,
};
use crate::push::{LoggingPushSink, PushPayload, PushPermission, PushSink};
use crate::store::{
    BadgeAggregator, ConversationRegistry, FriendRequestQueue, NotificationLedger,
    PersistentStore, Toast,
};

/// Single source of truth for the owner's social state.
/// Rehydrated from the store on construction; every mutation persists the
/// collection it touched and republishes the badge counts.
pub struct SocialCore {
    owner_id: UserId,
    toast_duration: Duration,
    store: PersistentStore,

    ledger: NotificationLedger,
    conversations: ConversationRegistry,
    friend_requests: FriendRequestQueue,

    push: Rc<dyn PushSink>,
    badge_tx: watch::Sender<AggregateBadgeState>,
}

impl SocialCore {
    pub fn new(config: &CoreConfig, store: PersistentStore, push: Rc<dyn PushSink>) -> Self {
        let records: Vec<NotificationRecord> =
            store.load(keys::NOTIFICATIONS_LEDGER).unwrap_or_default();
        let conversations: Vec<Conversation> =
            store.load(keys::CONVERSATIONS).unwrap_or_default();
        let requests: Vec<FriendRequest> = store.load(keys::FRIEND_REQUESTS).unwrap_or_default();

        tracing::info!(
            notifications = records.len(),
            conversations = conversations.len(),
            friend_requests = requests.len(),
            "Rehydrated social state"
        );

        let ledger = NotificationLedger::from_records(records, config.ledger_capacity);
        let conversations = ConversationRegistry::from_conversations(config.owner_id, conversations);
        let friend_requests = FriendRequestQueue::from_requests(requests);
        let initial = BadgeAggregator::recompute(&ledger, &conversations, &friend_requests);
        let (badge_tx, _) = watch::channel(initial);

        Self {
            owner_id: config.owner_id,
            toast_duration: config.toast_duration(),
            store,
            ledger,
            conversations,
            friend_requests,
            push,
            badge_tx,
        }
    }

    /// Ephemeral core with a logging push sink, for tests and dry runs.
    pub fn in_memory(config: &CoreConfig) -> Self {
        Self::new(
            config,
            PersistentStore::in_memory(),
            Rc::new(LoggingPushSink::new()),
        )
    }

    // ===== Getters =====

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn ledger(&self) -> &NotificationLedger {
        &self.ledger
    }

    pub fn conversations(&self) -> &ConversationRegistry {
        &self.conversations
    }

    pub fn friend_requests(&self) -> &FriendRequestQueue {
        &self.friend_requests
    }

    pub fn current_toast(&self) -> Option<&Toast> {
        self.ledger.current_toast()
    }

    // ===== Notifications =====

    /// Record a notification and make it the visible toast. A zero duration
    /// keeps the toast until it is hidden explicitly.
    pub fn show(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        duration: Duration,
    ) -> NotificationRecord {
        let record = self.ledger.record(title, message, kind, duration);
        tracing::debug!(id = %record.id, kind = %record.kind, "[{}] {}: {}", record.kind, record.title, record.message);
        self.save_ledger();
        self.refresh_badge();
        record
    }

    /// `show` with the configured toast duration.
    pub fn notify(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> NotificationRecord {
        let duration = self.toast_duration;
        self.show(title, message, kind, duration)
    }

    pub fn success(&mut self, title: impl Into<String>, message: impl Into<String>) -> NotificationRecord {
        self.notify(title, message, NotificationKind::Success)
    }

    pub fn error(&mut self, title: impl Into<String>, message: impl Into<String>) -> NotificationRecord {
        self.notify(title, message, NotificationKind::Error)
    }

    pub fn warning(&mut self, title: impl Into<String>, message: impl Into<String>) -> NotificationRecord {
        self.notify(title, message, NotificationKind::Warning)
    }

    pub fn info(&mut self, title: impl Into<String>, message: impl Into<String>) -> NotificationRecord {
        self.notify(title, message, NotificationKind::Info)
    }

    /// Record an inbound push in the ledger, then hand it to the push sink if
    /// permission was granted. Sink failures never touch state.
    pub fn push_notification(&mut self, payload: PushPayload) -> NotificationRecord {
        let record = self.notify(payload.title.clone(), payload.body.clone(), payload.kind);

        if self.push.permission() == PushPermission::Granted {
            if let Err(e) = self.push.deliver(&payload) {
                tracing::warn!("Push delivery failed for {}: {}", record.id, e);
            }
        }
        record
    }

    pub fn request_push_permission(&mut self) -> PushPermission {
        let permission = self.push.request_permission();
        if permission == PushPermission::Denied {
            self.warning(
                "Notifications blocked",
                "Please enable notifications in your settings",
            );
        }
        permission
    }

    pub fn mark_as_read(&mut self, id: &str) -> bool {
        let changed = self.ledger.mark_as_read(id);
        if changed {
            self.save_ledger();
            self.refresh_badge();
        }
        changed
    }

    pub fn mark_all_as_read(&mut self) -> usize {
        let changed = self.ledger.mark_all_as_read();
        if changed > 0 {
            self.save_ledger();
        }
        self.refresh_badge();
        changed
    }

    /// Empty the history, then confirm with a success toast. The confirmation
    /// is stored read so the notification badge ends at zero.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.ledger.clear_all();
        tracing::info!("Cleared {} notifications", removed);
        self.save_ledger();
        self.refresh_badge();
        self.success("Notifications cleared", "All notifications have been removed");
        removed
    }

    pub fn hide_toast(&mut self) -> Option<Toast> {
        self.ledger.hide_toast()
    }

    /// Hide the toast once its auto-hide deadline has passed.
    pub fn expire_toast(&mut self, now: Instant) -> bool {
        self.ledger.expire_toast(now)
    }

    // ===== Badge =====

    /// Recompute from the collections. Never reads a cached counter.
    pub fn update_badge(&self) -> AggregateBadgeState {
        BadgeAggregator::recompute(&self.ledger, &self.conversations, &self.friend_requests)
    }

    pub fn badge(&self) -> AggregateBadgeState {
        *self.badge_tx.borrow()
    }

    pub fn subscribe_badge(&self) -> watch::Receiver<AggregateBadgeState> {
        self.badge_tx.subscribe()
    }

    fn refresh_badge(&self) {
        let state = self.update_badge();
        // Receivers only wake when a count actually moved
        self.badge_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    // ===== Conversations =====

    pub fn find_or_create_direct(&mut self, other: UserId) -> ConversationId {
        let (id, created) = self.conversations.find_or_create_direct(other);
        if created {
            tracing::debug!("Started conversation {} with user {}", id, other);
            self.save_conversations();
            self.refresh_badge();
        }
        id
    }

    pub fn create_group(
        &mut self,
        name: impl Into<String>,
        participants: impl IntoIterator<Item = UserId>,
    ) -> Result<ConversationId, CoreError> {
        let id = self.conversations.create_group(name, participants)?;
        self.save_conversations();
        self.refresh_badge();
        Ok(id)
    }

    pub fn deliver_incoming(
        &mut self,
        id: ConversationId,
        message: IncomingMessage,
    ) -> Result<u32, CoreError> {
        let unread = self.conversations.deliver_incoming(id, message)?;
        tracing::debug!("Message delivered to conversation {} (unread: {})", id, unread);
        self.save_conversations();
        self.refresh_badge();
        Ok(unread)
    }

    pub fn send_message(&mut self, id: ConversationId, text: impl Into<String>) -> Result<(), CoreError> {
        self.conversations.send_outgoing(id, text)?;
        self.save_conversations();
        self.refresh_badge();
        Ok(())
    }

    pub fn open_conversation(&mut self, id: ConversationId) -> Result<u32, CoreError> {
        let cleared = self.conversations.open(id)?;
        // Opening can flip the last message to seen even with nothing unread
        self.save_conversations();
        self.refresh_badge();
        Ok(cleared)
    }

    pub fn close_conversation(&mut self, id: ConversationId) -> Result<(), CoreError> {
        self.conversations.close(id)
    }

    pub fn delete_conversation(&mut self, id: ConversationId) -> Result<Conversation, CoreError> {
        let removed = self.conversations.delete(id)?;
        tracing::info!("Deleted conversation {}", id);
        self.save_conversations();
        self.refresh_badge();
        Ok(removed)
    }

    pub fn mark_all_conversations_read(&mut self) -> usize {
        let cleared = self.conversations.mark_all_read();
        self.save_conversations();
        self.refresh_badge();
        cleared
    }

    pub fn toggle_mute(&mut self, id: ConversationId) -> Result<bool, CoreError> {
        let muted = self.conversations.toggle_mute(id)?;
        self.save_conversations();
        Ok(muted)
    }

    // ===== Friend requests =====

    pub fn enqueue_friend_request(&mut self, request: FriendRequest) -> Result<(), CoreError> {
        self.friend_requests.enqueue(request)?;
        self.save_friend_requests();
        self.refresh_badge();
        Ok(())
    }

    pub fn accept_friend_request(&mut self, id: UserId) -> Result<FriendRequest, CoreError> {
        let request = self.friend_requests.accept(id)?;
        self.save_friend_requests();
        self.refresh_badge();
        self.success("Friend added!", format!("You are now friends with {}", request.name));
        Ok(request)
    }

    pub fn decline_friend_request(&mut self, id: UserId) -> Result<FriendRequest, CoreError> {
        let request = self.friend_requests.decline(id)?;
        self.save_friend_requests();
        self.refresh_badge();
        self.info(
            "Request declined",
            format!("{}'s friend request was declined", request.name),
        );
        Ok(request)
    }

    // ===== Persistence =====

    fn save_ledger(&self) {
        self.store
            .save(keys::NOTIFICATIONS_LEDGER, &self.ledger.snapshot());
    }

    fn save_conversations(&self) {
        self.store
            .save(keys::CONVERSATIONS, self.conversations.conversations());
    }

    fn save_friend_requests(&self) {
        self.store
            .save(keys::FRIEND_REQUESTS, &self.friend_requests.snapshot());
    }
}
