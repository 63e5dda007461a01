//! `Actor` extractor: the caller's identity and capabilities.
//!
//! Authentication happens upstream; the gateway forwards the resolved user
//! in `x-user-id` and the granted capabilities in `x-capabilities`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use filedock_core::error::AppError;
use filedock_core::types::{Capabilities, UserId};
use filedock_service::context::RequestContext;

use crate::error::ApiError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying a comma-separated capability list.
pub const CAPABILITIES_HEADER: &str = "x-capabilities";

/// Request context available in handlers.
#[derive(Debug, Clone)]
pub struct Actor(pub RequestContext);

impl std::ops::Deref for Actor {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = match header_str(parts, USER_ID_HEADER)? {
            Some(raw) => Some(
                raw.parse::<UserId>()
                    .map_err(|_| AppError::validation(format!("Invalid {USER_ID_HEADER} header")))?,
            ),
            None => None,
        };

        let capabilities = match header_str(parts, CAPABILITIES_HEADER)? {
            Some(raw) => raw.parse::<Capabilities>()?,
            None => Capabilities::NONE,
        };

        Ok(Actor(RequestContext::new(user_id, capabilities)))
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, AppError> {
    parts
        .headers
        .get(name)
        .map(|v| {
            v.to_str()
                .map(str::trim)
                .map_err(|_| AppError::validation(format!("Header {name} is not valid text")))
        })
        .transpose()
}
