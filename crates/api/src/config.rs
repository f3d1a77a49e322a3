//! Process configuration, read from the environment once at startup.

use std::net::SocketAddr;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEV_JWT_SECRET: &str = "storefront-dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set when APP_ENV=production")]
    MissingSecret,

    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub jwt_secret: String,
    /// `APP_ENV=production`; turns on the `Secure` cookie attribute.
    pub production: bool,
    pub bind_addr: SocketAddr,
    /// PostgreSQL when set, in-memory otherwise.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Existing account promoted to admin at startup.
    pub admin_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let production = get("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if production => return Err(ConfigError::MissingSecret),
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse().map_err(|_| ConfigError::Invalid {
            var: "BIND_ADDR",
            value: bind_addr.clone(),
        })?;

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "DATABASE_MAX_CONNECTIONS",
                        value: raw,
                    });
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            jwt_secret,
            production,
            bind_addr,
            database_url: get("DATABASE_URL"),
            database_max_connections,
            admin_email: get("ADMIN_EMAIL"),
        })
    }
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("jwt_secret", &"<redacted>")
            .field("production", &self.production)
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("database_max_connections", &self.database_max_connections)
            .field("admin_email", &self.admin_email)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn dev_defaults() {
        let cfg = config(&[]).unwrap();
        assert!(!cfg.production);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.database_max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(cfg.admin_email, None);
    }

    #[test]
    fn production_requires_a_secret() {
        assert_eq!(
            config(&[("APP_ENV", "production")]).unwrap_err(),
            ConfigError::MissingSecret
        );
        assert_eq!(
            config(&[("APP_ENV", "Production"), ("JWT_SECRET", "  ")]).unwrap_err(),
            ConfigError::MissingSecret
        );

        let cfg = config(&[("APP_ENV", "production"), ("JWT_SECRET", "s3cret")]).unwrap();
        assert!(cfg.production);
        assert_eq!(cfg.jwt_secret, "s3cret");
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("ADMIN_EMAIL", "root@shop.io"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/shop"));
        assert_eq!(cfg.database_max_connections, 12);
        assert_eq!(cfg.admin_email.as_deref(), Some("root@shop.io"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { var: "BIND_ADDR", .. })
        ));
        assert!(matches!(
            config(&[("DATABASE_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::Invalid { var: "DATABASE_MAX_CONNECTIONS", .. })
        ));
    }

    #[test]
    fn debug_hides_secrets() {
        let cfg = config(&[("JWT_SECRET", "hunter22"), ("DATABASE_URL", "postgres://u:pw@db/x")]).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("hunter22"));
        assert!(!dbg.contains("pw@db"));
    }
}
