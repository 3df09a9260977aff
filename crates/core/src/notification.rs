//! Notification severity levels shared by flash messages and user inboxes.

use serde::{Deserialize, Serialize};

/// Severity of a user-facing message.
///
/// Serialized in lowercase (`"success"`, `"danger"`, ...) so the values line
/// up with the badge classes the admin front-end already uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Danger,
    Error,
}

impl NotificationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationLevel::Success => "success",
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Danger => "danger",
            NotificationLevel::Error => "error",
        }
    }
}

/// A `{type, text}` message returned inline with a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    #[serde(rename = "type")]
    pub level: NotificationLevel,
    pub text: String,
}

impl FlashMessage {
    pub fn new(level: NotificationLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, text)
    }
}
