//! Configuration builder for the Ollama transport

use crate::ollama::OllamaConfig;
use std::time::Duration;

/// Builder for Ollama configuration
#[derive(Debug, Default)]
pub struct OllamaConfigBuilder {
    host: Option<String>,
    default_model: Option<String>,
    timeout: Option<Duration>,
}

impl OllamaConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server URL or `host:port` address
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the default model
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Set the exchange timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the configuration, filling unset fields from `base`
    pub fn build_from(self, base: OllamaConfig) -> OllamaConfig {
        OllamaConfig {
            host: self.host.unwrap_or(base.host),
            default_model: self.default_model.unwrap_or(base.default_model),
            timeout: self.timeout.unwrap_or(base.timeout),
        }
    }

    /// Build the configuration
    pub fn build(self) -> OllamaConfig {
        self.build_from(OllamaConfig::default())
    }
}
