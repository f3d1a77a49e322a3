//! Shared collaborators handed to every handler.

use std::sync::Arc;

use storefront_auth::{Identity, TokenCodec};
use storefront_catalog::User;
use storefront_infra::Store;

use crate::session::SessionCarrier;

pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub codec: Arc<TokenCodec>,
    pub carrier: SessionCarrier,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, codec: TokenCodec, carrier: SessionCarrier) -> Self {
        Self {
            store,
            codec: Arc::new(codec),
            carrier,
        }
    }

    /// Mint a session token for `user`, snapshotting its current admin flag.
    pub fn issue_token(&self, user: &User) -> Result<String, storefront_auth::TokenError> {
        self.codec.encode(&identity_of(user))
    }
}

pub fn identity_of(user: &User) -> Identity {
    Identity {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
    }
}
