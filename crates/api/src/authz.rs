//! API-side authorization guard.
//!
//! Handlers call [`enforce`] after loading the resource (so a missing resource
//! answers 404 first) and before touching it.

use axum::response::Response;

use storefront_auth::{Identity, Policy, authorize};
use storefront_core::UserId;

use crate::app::errors;
use crate::context::CurrentIdentity;

/// Check `policy` for the caller against a resource owned by `owner`.
pub fn enforce(
    policy: Policy,
    current: &CurrentIdentity,
    owner: Option<UserId>,
) -> Result<(), Response> {
    authorize(policy, current.identity(), owner).map_err(|e| {
        tracing::info!(
            %policy,
            reason = ?e.reason(),
            user_id = ?current.user_id(),
            "access denied"
        );
        errors::authz_error_to_response(e)
    })
}

/// Require a session and hand back its identity.
pub fn authenticated(current: &CurrentIdentity) -> Result<&Identity, Response> {
    enforce(Policy::AuthenticatedOnly, current, None)?;
    current
        .identity()
        .ok_or_else(|| errors::authz_error_to_response(storefront_auth::AuthzError::Unauthenticated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn caller(id: i64, is_admin: bool) -> CurrentIdentity {
        CurrentIdentity::new(Some(Identity {
            id: UserId::new(id),
            username: format!("user{id}"),
            email: format!("user{id}@shop.io"),
            is_admin,
        }))
    }

    #[test]
    fn owner_passes_owner_only() {
        assert!(enforce(Policy::OwnerOnly, &caller(5, false), Some(UserId::new(5))).is_ok());
    }

    #[test]
    fn stranger_gets_403() {
        let res = enforce(Policy::OwnerOnly, &caller(5, false), Some(UserId::new(9))).unwrap_err();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn anonymous_gets_401() {
        let res = enforce(Policy::AdminOnly, &CurrentIdentity::anonymous(), None).unwrap_err();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn admin_overrides_ownership() {
        assert!(enforce(Policy::OwnerOrAdmin, &caller(2, true), Some(UserId::new(99))).is_ok());
    }

    #[test]
    fn authenticated_returns_identity() {
        let current = caller(7, false);
        assert_eq!(authenticated(&current).unwrap().id, UserId::new(7));
        assert!(authenticated(&CurrentIdentity::anonymous()).is_err());
    }
}
