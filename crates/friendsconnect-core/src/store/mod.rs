pub mod badge;
pub mod conversation_registry;
pub mod friend_request_queue;
pub mod kv_store;
pub mod notification_ledger;

pub use badge::BadgeAggregator;
pub use conversation_registry::ConversationRegistry;
pub use friend_request_queue::FriendRequestQueue;
pub use kv_store::{JsonFileStore, KeyValueStore, MemoryStore, PersistentStore, StoreError};
pub use notification_ledger::{NotificationLedger, Toast};
