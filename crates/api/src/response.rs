//! Shared response envelope types for API handlers.

use serde::Serialize;
use vstack_core::notification::FlashMessage;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Answer to a mutation: `{success, route?, message?}`.
///
/// `route` tells the client where to navigate next; `message` is a toast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<FlashMessage>,
}

impl ActionResponse {
    pub fn ok(route: impl Into<String>, message: FlashMessage) -> Self {
        Self {
            success: true,
            route: Some(route.into()),
            message: Some(message),
        }
    }

    pub fn failed(route: Option<String>, message: FlashMessage) -> Self {
        Self {
            success: false,
            route,
            message: Some(message),
        }
    }

    /// Bare `{success: true}`.
    pub fn accepted() -> Self {
        Self {
            success: true,
            route: None,
            message: None,
        }
    }
}
