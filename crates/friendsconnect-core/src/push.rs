//! Best-effort delivery of notifications outside the app.
//!
//! The core never depends on delivery succeeding. Ledger state is already
//! updated by the time a sink sees a payload.

use std::cell::Cell;

use serde::{Deserialize, Serialize};

use crate::models::NotificationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushPermission {
    /// Not asked yet
    #[default]
    Default,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(default = "default_kind")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

fn default_kind() -> NotificationKind {
    NotificationKind::Info
}

impl PushPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            kind: NotificationKind::Info,
            icon: None,
            tag: None,
        }
    }

    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Push notifications are not supported here")]
    Unsupported,

    #[error("Push delivery failed: {0}")]
    Delivery(String),
}

/// Destination for out-of-app notifications.
pub trait PushSink {
    fn permission(&self) -> PushPermission;

    /// Ask for permission. Sinks that cannot prompt report what they have.
    fn request_permission(&self) -> PushPermission {
        self.permission()
    }

    fn deliver(&self, payload: &PushPayload) -> Result<(), PushError>;
}

/// Sink that writes deliveries to the log instead of a system tray.
#[derive(Debug)]
pub struct LoggingPushSink {
    permission: Cell<PushPermission>,
    /// Answer given when permission is requested
    grant_on_request: bool,
}

impl LoggingPushSink {
    pub fn new() -> Self {
        Self {
            permission: Cell::new(PushPermission::Default),
            grant_on_request: true,
        }
    }

    pub fn granted() -> Self {
        Self {
            permission: Cell::new(PushPermission::Granted),
            grant_on_request: true,
        }
    }

    pub fn denying() -> Self {
        Self {
            permission: Cell::new(PushPermission::Default),
            grant_on_request: false,
        }
    }
}

impl Default for LoggingPushSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PushSink for LoggingPushSink {
    fn permission(&self) -> PushPermission {
        self.permission.get()
    }

    fn request_permission(&self) -> PushPermission {
        if self.permission.get() == PushPermission::Default {
            let answer = if self.grant_on_request {
                PushPermission::Granted
            } else {
                PushPermission::Denied
            };
            self.permission.set(answer);
        }
        self.permission.get()
    }

    fn deliver(&self, payload: &PushPayload) -> Result<(), PushError> {
        if self.permission.get() != PushPermission::Granted {
            return Err(PushError::Delivery("permission not granted".to_string()));
        }
        tracing::info!(
            title = %payload.title,
            kind = %payload.kind,
            tag = payload.tag.as_deref().unwrap_or(""),
            "push: {}",
            payload.body
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_permission_is_sticky() {
        let sink = LoggingPushSink::new();
        assert_eq!(sink.permission(), PushPermission::Default);
        assert_eq!(sink.request_permission(), PushPermission::Granted);

        let denying = LoggingPushSink::denying();
        assert_eq!(denying.request_permission(), PushPermission::Denied);
        assert_eq!(denying.request_permission(), PushPermission::Denied);
    }

    #[test]
    fn test_deliver_requires_grant() {
        let payload = PushPayload::new("Post liked", "Someone liked your recent post")
            .with_kind(NotificationKind::Like)
            .with_tag("demo-notification");
        assert!(LoggingPushSink::new().deliver(&payload).is_err());
        assert!(LoggingPushSink::granted().deliver(&payload).is_ok());
    }

    #[test]
    fn test_payload_kind_defaults_to_info() {
        let payload: PushPayload =
            serde_json::from_str(r#"{"title":"t","body":"b"}"#).unwrap();
        assert_eq!(payload.kind, NotificationKind::Info);
        assert!(payload.icon.is_none());
    }
}
