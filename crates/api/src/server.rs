//! Process bootstrap: store selection, admin promotion, serve, shutdown.

use std::sync::Arc;

use anyhow::Context;

use storefront_auth::TokenCodec;
use storefront_infra::{InMemoryStore, PostgresStore, Store, StoreError};

use crate::app::{self, AppServices};
use crate::config::AppConfig;
use crate::session::SessionCarrier;

/// Open the configured store. PostgreSQL gets its schema created on the way.
pub async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url, config.database_max_connections)
                .await
                .context("failed to connect to DATABASE_URL")?;
            store.migrate().await.context("failed to create schema")?;
            tracing::info!("using postgres store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on exit)");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

/// Grant the admin flag to the account registered under `email`.
///
/// Returns whether such an account exists.
pub async fn promote_admin(store: &dyn Store, email: &str) -> Result<bool, StoreError> {
    let Some(credentials) = store.find_credentials_by_email(email).await? else {
        return Ok(false);
    };
    if credentials.user.is_admin {
        return Ok(true);
    }
    Ok(store.set_admin(credentials.user.id, true).await?.is_some())
}

pub fn services(config: &AppConfig, store: Arc<dyn Store>) -> AppServices {
    AppServices::new(
        store,
        TokenCodec::new(config.jwt_secret.as_bytes()),
        SessionCarrier::new(config.production),
    )
}

/// Serve until ctrl-c, then close the store.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let store = build_store(&config).await?;

    if let Some(email) = &config.admin_email {
        match promote_admin(store.as_ref(), email).await {
            Ok(true) => tracing::info!(%email, "admin account ready"),
            Ok(false) => tracing::warn!(%email, "ADMIN_EMAIL does not match a registered user"),
            Err(e) => tracing::error!(%email, error = %e, "failed to promote admin"),
        }
    }

    let services = Arc::new(services(&config, store.clone()));
    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_catalog::NewUser;

    #[tokio::test]
    async fn promote_admin_flags_existing_user() {
        let store = InMemoryStore::new();
        let user = store
            .create_user(NewUser {
                username: "root".to_string(),
                email: "root@shop.io".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        assert!(!user.is_admin);

        assert!(promote_admin(&store, "root@shop.io").await.unwrap());
        assert!(store.get_user(user.id).await.unwrap().unwrap().is_admin);

        // idempotent
        assert!(promote_admin(&store, "root@shop.io").await.unwrap());
    }

    #[tokio::test]
    async fn promote_admin_reports_unknown_email() {
        let store = InMemoryStore::new();
        assert!(!promote_admin(&store, "ghost@shop.io").await.unwrap());
    }
}
