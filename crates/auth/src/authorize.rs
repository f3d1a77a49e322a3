use serde::Serialize;
use thiserror::Error;

use storefront_core::UserId;

use crate::Identity;

/// Named access policy attached to a protected operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Anyone, with or without a session.
    Public,
    /// Any authenticated identity.
    AuthenticatedOnly,
    /// Only the identity that owns the resource.
    OwnerOnly,
    /// Only identities carrying the admin flag.
    AdminOnly,
    /// The owner, or any admin.
    OwnerOrAdmin,
}

impl Policy {
    pub const ALL: [Policy; 5] = [
        Policy::Public,
        Policy::AuthenticatedOnly,
        Policy::OwnerOnly,
        Policy::AdminOnly,
        Policy::OwnerOrAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::Public => "public",
            Policy::AuthenticatedOnly => "authenticated_only",
            Policy::OwnerOnly => "owner_only",
            Policy::AdminOnly => "admin_only",
            Policy::OwnerOrAdmin => "owner_or_admin",
        }
    }

    /// Human-readable message for an insufficient-privilege denial.
    pub fn forbidden_message(&self) -> &'static str {
        match self {
            Policy::Public | Policy::AuthenticatedOnly => "access denied",
            Policy::OwnerOnly => "only the owner of this resource can do that, access denied",
            Policy::AdminOnly => "only admin can do that, access denied",
            Policy::OwnerOrAdmin => "only the owner or an admin can do that, access denied",
        }
    }
}

impl core::fmt::Display for Policy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request was denied.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// No usable credential (absent, malformed, tampered or expired).
    NoCredential,
    /// A valid identity that does not satisfy the policy.
    InsufficientPrivilege,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenialReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("no token provided, access denied")]
    Unauthenticated,

    #[error("forbidden: {policy} policy not satisfied")]
    Forbidden { policy: Policy },
}

impl AuthzError {
    pub fn reason(&self) -> DenialReason {
        match self {
            AuthzError::Unauthenticated => DenialReason::NoCredential,
            AuthzError::Forbidden { .. } => DenialReason::InsufficientPrivilege,
        }
    }
}

/// Decide whether `identity` may act on a resource owned by `resource_owner`.
///
/// - No IO
/// - No panics
/// - Total over every (policy, identity, owner) combination
///
/// An owner-based policy with no owner never matches.
pub fn decide(policy: Policy, identity: Option<&Identity>, resource_owner: Option<UserId>) -> Decision {
    if policy == Policy::Public {
        return Decision::Allow;
    }

    let Some(identity) = identity else {
        return Decision::Deny(DenialReason::NoCredential);
    };

    let is_owner = resource_owner == Some(identity.id);
    let allowed = match policy {
        Policy::Public | Policy::AuthenticatedOnly => true,
        Policy::OwnerOnly => is_owner,
        Policy::AdminOnly => identity.is_admin,
        Policy::OwnerOrAdmin => is_owner || identity.is_admin,
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny(DenialReason::InsufficientPrivilege)
    }
}

/// [`decide`], shaped as a `Result` for `?`-style call sites.
pub fn authorize(
    policy: Policy,
    identity: Option<&Identity>,
    resource_owner: Option<UserId>,
) -> Result<(), AuthzError> {
    match decide(policy, identity, resource_owner) {
        Decision::Allow => Ok(()),
        Decision::Deny(DenialReason::NoCredential) => Err(AuthzError::Unauthenticated),
        Decision::Deny(DenialReason::InsufficientPrivilege) => Err(AuthzError::Forbidden { policy }),
    }
}
