//! Request context carrying the acting user and their resolved capabilities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filedock_core::error::AppError;
use filedock_core::types::{Capabilities, UserId};

/// Context for the current request.
///
/// Built by the API layer from headers set by the fronting gateway and
/// passed into service methods so that every operation knows who is
/// acting and what they may do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user, if the request is authenticated.
    pub user_id: Option<UserId>,
    /// What the caller may do.
    pub capabilities: Capabilities,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: Option<UserId>, capabilities: Capabilities) -> Self {
        Self {
            user_id,
            capabilities,
            request_time: Utc::now(),
        }
    }

    /// Context with no user and no capabilities.
    pub fn anonymous() -> Self {
        Self::new(None, Capabilities::NONE)
    }

    /// Whether `user_id` is the acting user.
    pub fn is_user(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }

    /// Fail with `Forbidden` unless the caller holds `list`.
    pub fn require_list(&self) -> Result<(), AppError> {
        if self.capabilities.list {
            Ok(())
        } else {
            Err(AppError::forbidden("Listing files requires the 'list' capability"))
        }
    }

    /// Fail with `Forbidden` unless the caller holds `manage`.
    pub fn require_manage(&self) -> Result<(), AppError> {
        if self.capabilities.manage {
            Ok(())
        } else {
            Err(AppError::forbidden("Changing files requires the 'manage' capability"))
        }
    }
}
