//! Application-wide constants
//!
//! Centralized location for storage keys, limits and timing defaults
//! that are used across multiple modules.

/// Maximum number of notification records kept in the ledger
pub const LEDGER_CAPACITY: usize = 100;

/// Badge counts above this value are rendered as "99+"
pub const BADGE_OVERFLOW: usize = 99;

/// The signed-in demo user
pub const DEFAULT_OWNER_ID: u64 = 1;

// Timing defaults
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_FIRE_PROBABILITY: f64 = 0.1;
pub const DEFAULT_TOAST_DURATION_MS: u64 = 4000;

/// How often the runtime checks whether the visible toast has expired
pub const TOAST_SWEEP_INTERVAL_MS: u64 = 100;

/// Simulated "typing" pause before a counterpart replies
pub const REPLY_TYPING_DELAY_MS: u64 = 1500;
/// Extra pause after typing stops before the reply lands
pub const REPLY_SEND_DELAY_MS: u64 = 500;

/// Tag attached to pushes produced by the polling scheduler
pub const DEMO_PUSH_TAG: &str = "demo-notification";
pub const DEMO_PUSH_ICON: &str = "/assets/logo.png";

// Persisted collection keys
pub mod keys {
    /// Notification ledger (most recent first)
    pub const NOTIFICATIONS_LEDGER: &str = "notifications_ledger";
    /// Conversation snapshots
    pub const CONVERSATIONS: &str = "conversations";
    /// Pending inbound friend requests
    pub const FRIEND_REQUESTS: &str = "friend_requests";
}

// Environment overrides read by CoreConfig::from_env
pub mod env {
    pub const DATA_DIR: &str = "FRIENDSCONNECT_DATA_DIR";
    pub const POLL_SECS: &str = "FRIENDSCONNECT_POLL_SECS";
    pub const SEED: &str = "FRIENDSCONNECT_SEED";
    pub const LOG_FILE: &str = "FRIENDSCONNECT_LOG_FILE";
}
