//! HTTP implementation of [`RegistryClient`].

use super::{RegistryClient, RegistryError, RegistryMod};
use crate::constants::{
    MAX_BACKOFF_DELAY_MS, REGISTRY_MAX_ATTEMPTS, REGISTRY_REQUEST_TIMEOUT,
    STARTING_BACKOFF_DELAY_MS,
};
use anyhow::{Context, Result};
use dashmap::DashMap;
use reqwest::StatusCode;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::debug;

/// Registry client speaking the mod portal's JSON API.
///
/// Metadata is cached per MOD name for the lifetime of the client, so the
/// rounds of one install plan never fetch the same MOD twice.
pub struct HttpRegistry {
    client: reqwest::Client,
    base_url: String,
    cache: DashMap<String, RegistryMod>,
}

impl HttpRegistry {
    /// Create a client for the registry rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REGISTRY_REQUEST_TIMEOUT)
            .user_agent(concat!("modpm/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: DashMap::new(),
        })
    }

    /// Registry root URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn mod_url(&self, name: &str) -> String {
        format!("{}/api/mods/{name}/full", self.base_url)
    }

    async fn fetch_once(&self, name: &str) -> Result<RegistryMod, RegistryError> {
        let url = self.mod_url(name);
        debug!("GET {url}");

        let response = self.client.get(&url).send().await.map_err(|e| RegistryError::Http {
            name: name.to_string(),
            message: e.to_string(),
            transient: true,
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound {
                name: name.to_string(),
            });
        }
        if !status.is_success() {
            return Err(RegistryError::Http {
                name: name.to_string(),
                message: format!("HTTP {status}"),
                transient: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
            });
        }

        response.json::<RegistryMod>().await.map_err(|e| RegistryError::Decode {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}

impl RegistryClient for HttpRegistry {
    async fn fetch_mod(&self, name: &str) -> Result<RegistryMod, RegistryError> {
        let cached = self.cache.get(name).map(|entry| entry.value().clone());
        if let Some(registry_mod) = cached {
            return Ok(registry_mod);
        }

        let strategy = ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS))
            .factor(2)
            .take(REGISTRY_MAX_ATTEMPTS - 1);

        let registry_mod =
            RetryIf::spawn(strategy, || self.fetch_once(name), RegistryError::is_transient)
                .await?;

        debug!("Fetched {} releases of '{name}'", registry_mod.releases.len());
        self.cache.insert(name.to_string(), registry_mod.clone());
        Ok(registry_mod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_url_strips_trailing_slash() {
        let registry = HttpRegistry::new("https://mods.example.com/").unwrap();
        assert_eq!(registry.base_url(), "https://mods.example.com");
        assert_eq!(registry.mod_url("helmod"), "https://mods.example.com/api/mods/helmod/full");
    }

    #[tokio::test]
    async fn test_cached_metadata_skips_network() {
        // Port 9 is discard; any real request would fail
        let registry = HttpRegistry::new("http://127.0.0.1:9").unwrap();
        registry.cache.insert(
            "cached".to_string(),
            RegistryMod {
                name: "cached".to_string(),
                title: String::new(),
                owner: String::new(),
                releases: Vec::new(),
            },
        );

        let fetched = registry.fetch_mod("cached").await.unwrap();
        assert_eq!(fetched.name, "cached");
    }
}
