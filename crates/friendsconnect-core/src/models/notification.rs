use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
    Like,
    Comment,
    Friend,
    Share,
    Mention,
    Event,
}

impl NotificationKind {
    /// Successes are informational toasts and never raise the unread badge.
    pub fn counts_as_unread(&self) -> bool {
        !matches!(self, NotificationKind::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Friend => "friend",
            NotificationKind::Share => "share",
            NotificationKind::Mention => "mention",
            NotificationKind::Event => "event",
        }
    }

    /// Get the icon for this kind
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationKind::Success => "✓",
            NotificationKind::Error => "✗",
            NotificationKind::Warning => "⚠",
            NotificationKind::Info => "ℹ",
            NotificationKind::Like => "♥",
            NotificationKind::Comment => "💬",
            NotificationKind::Friend => "+",
            NotificationKind::Share => "↗",
            NotificationKind::Mention => "@",
            NotificationKind::Event => "📅",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the notification ledger.
///
/// Accepts the legacy `type`/`timestamp` field names when reading older blobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(alias = "type")]
    pub kind: NotificationKind,
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl NotificationRecord {
    pub fn new(title: impl Into<String>, message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            id: generate_notification_id(),
            title: title.into(),
            message: message.into(),
            kind,
            created_at: Utc::now(),
            read: !kind.counts_as_unread(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn is_unread(&self) -> bool {
        !self.read
    }
}

/// Time-ordered UUIDv7, so ids sort roughly by creation time.
pub fn generate_notification_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_success_is_created_read() {
        let record = NotificationRecord::new("Saved", "Profile saved", NotificationKind::Success);
        assert!(record.read);

        for kind in [
            NotificationKind::Error,
            NotificationKind::Info,
            NotificationKind::Friend,
            NotificationKind::Mention,
        ] {
            assert!(NotificationRecord::new("t", "m", kind).is_unread(), "{kind} should be unread");
        }
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_notification_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_generated_ids_are_v7_uuids() {
        let id = generate_notification_id();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn test_reads_legacy_field_names() {
        let json = r#"{
            "id": "abc",
            "title": "Post liked",
            "message": "Someone liked your recent post",
            "type": "like",
            "timestamp": "2024-05-01T10:00:00Z",
            "read": false
        }"#;
        let record: NotificationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, NotificationKind::Like);
        assert_eq!(record.created_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert!(record.is_unread());
    }

    #[test]
    fn test_writes_camel_case_kind() {
        let record = NotificationRecord::new("t", "m", NotificationKind::Mention).with_id("x");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["kind"], "mention");
        assert!(value.get("createdAt").is_some());
    }
}
