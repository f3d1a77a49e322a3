use storefront_auth::Identity;
use storefront_core::UserId;

/// Authentication result for a request.
///
/// Inserted by the authentication middleware on every route. `None` covers
/// both "no credential" and "invalid or expired credential".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentIdentity {
    identity: Option<Identity>,
}

impl CurrentIdentity {
    pub fn new(identity: Option<Identity>) -> Self {
        Self { identity }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.identity.as_ref().map(|i| i.id)
    }
}
