//! Server configuration from `PARKADE_*` environment variables.

use std::env;

use anyhow::{Context, Result};
use parkade_db::DbConfig;
use parkade_service::ServiceConfig;

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub service: ServiceConfig,
}

impl ServerConfig {
    /// Read overrides from the environment. Unset variables keep their
    /// defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        let db = &mut config.db;
        for (key, slot) in [
            ("PARKADE_DB_URL", &mut db.url),
            ("PARKADE_DB_NAMESPACE", &mut db.namespace),
            ("PARKADE_DB_DATABASE", &mut db.database),
            ("PARKADE_DB_USERNAME", &mut db.username),
            ("PARKADE_DB_PASSWORD", &mut db.password),
        ] {
            if let Some(value) = lookup(key) {
                *slot = value;
            }
        }

        if let Some(raw) = lookup("PARKADE_RECENT_CHECKOUT_LIMIT") {
            config.service.recent_checkout_limit = raw
                .parse()
                .with_context(|| format!("PARKADE_RECENT_CHECKOUT_LIMIT is not a count: {raw:?}"))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db.url, "127.0.0.1:8000");
        assert_eq!(config.db.namespace, "parkade");
        assert_eq!(config.service.recent_checkout_limit, 10);
    }

    #[test]
    fn overrides_are_applied() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PARKADE_DB_URL", "db.internal:8000"),
            ("PARKADE_DB_DATABASE", "garage"),
            ("PARKADE_RECENT_CHECKOUT_LIMIT", "25"),
        ]))
        .unwrap();
        assert_eq!(config.db.url, "db.internal:8000");
        assert_eq!(config.db.database, "garage");
        assert_eq!(config.db.username, "root");
        assert_eq!(config.service.recent_checkout_limit, 25);
    }

    #[test]
    fn bad_limit_is_an_error() {
        let err = ServerConfig::from_lookup(lookup(&[("PARKADE_RECENT_CHECKOUT_LIMIT", "ten")]))
            .unwrap_err();
        assert!(err.to_string().contains("PARKADE_RECENT_CHECKOUT_LIMIT"));
    }
}
