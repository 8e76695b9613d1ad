//! # Actor Resolution and Authorization
//!
//! Authentication is owned by the surrounding system; every request arrives
//! with an `X-Actor-Id` header naming the already-authenticated user. This
//! module resolves that header against the user store into a typed
//! [`Principal`] and provides the capability checks handlers authorize with.
//! No ambient current-user state: the principal is threaded explicitly.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, forbidden, unauthorized};
use crate::models::user;
use crate::repositories::UserRepository;
use crate::server::AppState;

/// Header carrying the externally authenticated user id.
pub const ACTOR_HEADER: &str = "X-Actor-Id";

/// Authenticated principal for the current request.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub is_admin: bool,
    pub is_sales_agent: bool,
    pub is_ceo: bool,
}

impl From<user::Model> for Principal {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            is_admin: user.is_admin,
            is_sales_agent: user.is_sales_agent,
            is_ceo: user.is_ceo,
        }
    }
}

impl Principal {
    /// Admin capability gate for assignment, import, and role management.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(forbidden(Some("Admin access required")))
        }
    }

    /// Executive dashboard gate; admins see everything the CEO sees.
    pub fn require_ceo(&self) -> Result<(), ApiError> {
        if self.is_ceo || self.is_admin {
            Ok(())
        } else {
            Err(forbidden(Some("CEO access required")))
        }
    }

    /// Sales dashboard gate; admins may inspect any agent's view.
    pub fn require_sales_agent(&self) -> Result<(), ApiError> {
        if self.is_sales_agent || self.is_admin {
            Ok(())
        } else {
            Err(forbidden(Some("Sales agent access required")))
        }
    }
}

/// Middleware that resolves `X-Actor-Id` to a [`Principal`] request extension.
pub async fn actor_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor_id = extract_actor_id(request.headers())?;

    let repo = UserRepository::new(&state.db);
    let user = repo
        .get_user(actor_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| unauthorized(Some("Unknown actor")))?;

    tracing::debug!(actor_id = %user.id, username = %user.username, "Resolved request actor");

    let mut request = request;
    request.extensions_mut().insert(Principal::from(user));

    Ok(next.run(request).await)
}

fn extract_actor_id(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let header_value = headers
        .get(ACTOR_HEADER)
        .ok_or_else(|| unauthorized(Some("Missing X-Actor-Id header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid X-Actor-Id header")))?;

    header_value
        .parse::<Uuid>()
        .map_err(|_| unauthorized(Some("X-Actor-Id must be a valid UUID")))
}

impl<S> FromRequestParts<S> for Principal
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| unauthorized(Some("Actor context missing")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(admin: bool, agent: bool, ceo: bool) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            username: "test".to_string(),
            display_name: "Test User".to_string(),
            is_admin: admin,
            is_sales_agent: agent,
            is_ceo: ceo,
        }
    }

    #[test]
    fn admin_gate_rejects_non_admins() {
        assert!(principal(true, false, false).require_admin().is_ok());
        assert!(principal(false, true, false).require_admin().is_err());
        assert!(principal(false, false, true).require_admin().is_err());
    }

    #[test]
    fn ceo_gate_admits_admins() {
        assert!(principal(false, false, true).require_ceo().is_ok());
        assert!(principal(true, false, false).require_ceo().is_ok());
        assert!(principal(false, true, false).require_ceo().is_err());
    }

    #[test]
    fn sales_gate_admits_admins() {
        assert!(principal(false, true, false).require_sales_agent().is_ok());
        assert!(principal(true, false, false).require_sales_agent().is_ok());
        assert!(principal(false, false, true).require_sales_agent().is_err());
    }

    #[test]
    fn actor_id_extraction() {
        let mut headers = HeaderMap::new();
        assert!(extract_actor_id(&headers).is_err());

        headers.insert(ACTOR_HEADER, "not-a-uuid".parse().unwrap());
        assert!(extract_actor_id(&headers).is_err());

        let id = Uuid::new_v4();
        headers.insert(ACTOR_HEADER, id.to_string().parse().unwrap());
        assert_eq!(extract_actor_id(&headers).unwrap(), id);
    }
}
