use std::env;
use std::net::SocketAddr;

use crate::blobs::BlobConfig;
use crate::error::AppError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://noteverse.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_NOTIFY_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Remote blob storage. PDFs are embedded as data URLs when unset.
    pub blobs: Option<BlobConfig>,
    pub notify_capacity: usize,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any variable source, `new_from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let blobs = match (lookup("BLOB_UPLOAD_URL"), lookup("BLOB_UPLOAD_TOKEN")) {
            (Some(endpoint), Some(token)) => Some(BlobConfig { endpoint, token }),
            (Some(_), None) => {
                return Err(AppError::Config("BLOB_UPLOAD_TOKEN is not set".to_string()));
            }
            _ => None,
        };

        let notify_capacity = match lookup("NOTIFY_CAPACITY") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|c| *c > 0)
                .ok_or_else(|| AppError::Config(format!("NOTIFY_CAPACITY is invalid: {}", raw)))?,
            None => DEFAULT_NOTIFY_CAPACITY,
        };

        Ok(Self {
            database_url,
            bind_addr,
            blobs,
            notify_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(config.blobs.is_none());
        assert_eq!(config.notify_capacity, DEFAULT_NOTIFY_CAPACITY);
    }

    #[test]
    fn test_blob_url_requires_token() {
        let result = config_from(&[("BLOB_UPLOAD_URL", "https://blobs.example.com")]);
        assert!(matches!(result, Err(AppError::Config(_))));

        let config = config_from(&[
            ("BLOB_UPLOAD_URL", "https://blobs.example.com"),
            ("BLOB_UPLOAD_TOKEN", "secret"),
        ])
        .unwrap();
        let blobs = config.blobs.expect("blob config");
        assert_eq!(blobs.endpoint, "https://blobs.example.com");
        assert_eq!(blobs.token, "secret");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for capacity in ["0", "-3", "lots"] {
            assert!(matches!(
                config_from(&[("NOTIFY_CAPACITY", capacity)]),
                Err(AppError::Config(_))
            ));
        }
        assert!(matches!(
            config_from(&[("BIND_ADDR", "localhost")]),
            Err(AppError::Config(_))
        ));
        assert_eq!(config_from(&[("NOTIFY_CAPACITY", "8")]).unwrap().notify_capacity, 8);
    }
}
