//! The identity a request is acting on behalf of.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// The user (if any) behind the current request.
///
/// Authentication happens upstream; this is the already-resolved identity
/// that permission predicates are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Option<DbId>,
    pub role: Option<String>,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: DbId, role: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            role: Some(role.into()),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }
}
