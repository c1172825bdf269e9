//! Ollama transport configuration

use crate::config_builder::OllamaConfigBuilder;
use crate::constants::{
    DEFAULT_TIMEOUT_SECS, OLLAMA_DEFAULT_HOST, OLLAMA_DEFAULT_MODEL, OLLAMA_HOST_ENV,
    OLLAMA_MODEL_ENV,
};
use palaver_core::Error;
use std::time::Duration;
use url::Url;

/// Configuration for the Ollama transport
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    /// Server URL or `host:port` address
    pub host: String,
    /// Model used when a request does not name one
    pub default_model: String,
    /// Timeout for a whole exchange
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: OLLAMA_DEFAULT_HOST.to_string(),
            default_model: OLLAMA_DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OllamaConfig {
    /// Create a new configuration builder
    pub fn builder() -> OllamaConfigBuilder {
        OllamaConfigBuilder::new()
    }

    /// Defaults overridden by `OLLAMA_HOST` and `OLLAMA_MODEL`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(host) = lookup(OLLAMA_HOST_ENV).filter(|v| !v.is_empty()) {
            config.host = host;
        }
        if let Some(model) = lookup(OLLAMA_MODEL_ENV).filter(|v| !v.is_empty()) {
            config.default_model = model;
        }
        config
    }

    /// The base URL of the server, without a trailing `/`
    pub fn base_url(&self) -> String {
        host_url(&self.host)
    }

    /// The full URL of an API path such as `/api/chat`
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let url = format!("{}{}", self.base_url(), path);
        Url::parse(&url)
            .map_err(|e| Error::Configuration(format!("Invalid Ollama host {:?}: {}", self.host, e)))
    }
}

/// Turn a host setting into a base URL
///
/// Anything containing `://` is taken as a URL and loses one trailing `/`;
/// anything else is a network address reached over plain HTTP.
pub fn host_url(host: &str) -> String {
    if host.contains("://") {
        host.strip_suffix('/').unwrap_or(host).to_string()
    } else {
        format!("http://{}", host)
    }
}
