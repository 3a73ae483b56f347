// Configuration management module
// Loads service settings from environment variables. Store credentials are
// optional at load time and checked on every request instead
//
// Numan Thabit 2025 Nov

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use crate::errors::CounterError;

pub const DEFAULT_DATABASE: &str = "visitors";
pub const DEFAULT_CONTAINER: &str = "counter";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Document store account endpoint, e.g. https://myaccount.documents.azure.com:443/
    pub cosmos_endpoint: Option<String>,
    /// Base64 master key for the account (never logged)
    pub cosmos_key: Option<String>,
    /// Logical database name
    pub cosmos_database: String,
    /// Container holding the counter documents, partitioned on /id
    pub cosmos_container: String,
    /// Also increment the per-day bucket
    pub track_daily: bool,
    pub listen_address: SocketAddr,
    /// HTTP client timeout for store calls
    pub store_timeout_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_source(None)
    }

    /// Load from an explicit variable map instead of the process environment.
    pub fn from_source(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let cfg = config::Config::builder()
            .set_default("cosmos_database", DEFAULT_DATABASE)?
            .set_default("cosmos_container", DEFAULT_CONTAINER)?
            .set_default("track_daily", true)?
            .set_default("listen_address", "0.0.0.0:8080")?
            .set_default("store_timeout_secs", 10)?
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .context("build configuration")?;
        cfg.try_deserialize().context("deserialize configuration")
    }

    pub fn has_endpoint(&self) -> bool {
        is_set(&self.cosmos_endpoint)
    }

    pub fn has_key(&self) -> bool {
        is_set(&self.cosmos_key)
    }

    /// Connection settings, or a config error when endpoint or key is missing.
    pub fn store_settings(&self) -> Result<StoreSettings, CounterError> {
        if !self.has_endpoint() || !self.has_key() {
            return Err(CounterError::config("Missing COSMOS_ENDPOINT or COSMOS_KEY"));
        }
        Ok(StoreSettings {
            endpoint: self.cosmos_endpoint.clone().unwrap_or_default(),
            key: self.cosmos_key.clone().unwrap_or_default(),
            database: self.cosmos_database.clone(),
            container: self.cosmos_container.clone(),
            timeout: Duration::from_secs(self.store_timeout_secs),
        })
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct StoreSettings {
    pub endpoint: String,
    pub key: String,
    pub database: String,
    pub container: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSettings")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .field("database", &self.database)
            .field("container", &self.container)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_without_any_variables() {
        let cfg = AppConfig::from_source(Some(HashMap::new())).unwrap();
        assert_eq!(cfg.cosmos_database, "visitors");
        assert_eq!(cfg.cosmos_container, "counter");
        assert!(cfg.track_daily);
        assert_eq!(cfg.listen_address.port(), 8080);
        assert!(!cfg.has_endpoint());
        assert!(!cfg.has_key());
    }

    #[test]
    fn overrides_are_read_from_variables() {
        let cfg = AppConfig::from_source(Some(vars(&[
            ("COSMOS_ENDPOINT", "https://acct.documents.azure.com:443/"),
            ("COSMOS_KEY", "c2VjcmV0"),
            ("COSMOS_DATABASE", "site"),
            ("COSMOS_CONTAINER", "hits"),
            ("TRACK_DAILY", "false"),
            ("STORE_TIMEOUT_SECS", "3"),
        ])))
        .unwrap();
        assert!(!cfg.track_daily);
        let settings = cfg.store_settings().unwrap();
        assert_eq!(settings.database, "site");
        assert_eq!(settings.container, "hits");
        assert_eq!(settings.timeout, Duration::from_secs(3));
        assert!(!format!("{settings:?}").contains("c2VjcmV0"));
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let cfg = AppConfig::from_source(Some(vars(&[(
            "COSMOS_ENDPOINT",
            "https://acct.documents.azure.com:443/",
        )])))
        .unwrap();
        let err = cfg.store_settings().unwrap_err();
        assert!(matches!(err, CounterError::Config { .. }));
    }

    #[test]
    fn empty_endpoint_counts_as_missing() {
        let cfg = AppConfig::from_source(Some(vars(&[
            ("COSMOS_ENDPOINT", ""),
            ("COSMOS_KEY", "c2VjcmV0"),
        ])))
        .unwrap();
        assert!(!cfg.has_endpoint());
        assert!(cfg.store_settings().is_err());
    }
}
