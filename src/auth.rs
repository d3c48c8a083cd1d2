use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::ServiceError;

pub const ADMIN_ROLE: &str = "admin";

/// Authenticated principal for a request.
///
/// The identity is taken from headers populated by the session layer in
/// front of this service (`x-user-id`, `x-user-role`); token verification
/// itself lives there, not here.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub is_admin: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))?;

        let is_admin = parts
            .headers
            .get("x-user-role")
            .and_then(|value| value.to_str().ok())
            .map(|role| role.eq_ignore_ascii_case(ADMIN_ROLE))
            .unwrap_or(false);

        Ok(AuthUser { user_id, is_admin })
    }
}

/// Guard for owner-scoped resources: the caller must own the resource or
/// hold the admin role.
pub fn ensure_owner_or_admin(auth: &AuthUser, owner_id: Uuid) -> Result<(), ServiceError> {
    if auth.is_admin || auth.user_id == owner_id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "You do not have permission to access this resource".to_string(),
        ))
    }
}

/// Guard for admin-only operations.
pub fn ensure_admin(auth: &AuthUser) -> Result<(), ServiceError> {
    if auth.is_admin {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Administrator access required".to_string(),
        ))
    }
}
