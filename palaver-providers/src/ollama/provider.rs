//! Ollama transport implementation
//!
//! Sends chat requests to `/api/chat` and embedding requests to `/api/embed`
//! of a local or remote Ollama server. Responses are never streamed.

use async_trait::async_trait;
use palaver_core::{EmbedRequest, EmbedResponse, Error, Request, Response, Transport};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::constants::{CHAT_PATH, EMBED_PATH};
use crate::error::{http_error, serialization_error};
use crate::hooks::{Hooks, RequestHook, ResponseHook, TraceHook};
use crate::http::{HttpClient, ReqwestClient};
use crate::ollama::config::OllamaConfig;

/// Ollama transport
///
/// Cheap to clone; clones share the HTTP client and hooks.
///
/// # Example
///
/// ```no_run
/// use palaver_providers::{HeaderHook, Ollama};
///
/// # fn example() -> Result<(), palaver_core::Error> {
/// // Local instance, honoring OLLAMA_HOST and OLLAMA_MODEL
/// let ollama = Ollama::from_env()?;
///
/// // Remote instance behind a proxy that wants a token
/// let ollama = Ollama::builder()
///     .host("https://ollama.internal/")
///     .model("qwen2.5")
///     .request_hook(HeaderHook::bearer("secret")?)
///     .trace()
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Ollama {
    config: OllamaConfig,
    client: Arc<dyn HttpClient>,
    hooks: Hooks,
}

impl Ollama {
    /// Create a transport with the given configuration and client
    pub fn new(config: OllamaConfig, client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            client,
            hooks: Hooks::new(),
        }
    }

    /// Create a transport for `http://localhost:11434`
    pub fn local() -> Result<Self, Error> {
        Ok(Self::new(
            OllamaConfig::default(),
            Arc::new(ReqwestClient::new()?),
        ))
    }

    /// Create a transport configured from `OLLAMA_HOST` and `OLLAMA_MODEL`
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self::new(
            OllamaConfig::from_env(),
            Arc::new(ReqwestClient::new()?),
        ))
    }

    /// Create a transport for a server URL or `host:port` address
    pub fn with_host(host: impl Into<String>) -> Result<Self, Error> {
        Self::builder().host(host).build()
    }

    /// Create a builder, starting from the environment configuration
    pub fn builder() -> OllamaBuilder {
        OllamaBuilder::new()
    }

    /// The configuration in use
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Exchange a chat request for the complete response
    pub async fn chat(&self, request: &Request) -> Result<Response, Error> {
        let mut body = serde_json::to_value(request).map_err(serialization_error)?;
        if request.model.is_empty() {
            body["model"] = Value::from(self.config.default_model.as_str());
        }
        body["stream"] = Value::Bool(false);

        debug!(
            model = %body["model"],
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Ollama chat"
        );
        self.post(CHAT_PATH, &body).await
    }

    /// Compute embeddings, one vector per input
    pub async fn embed(&self, request: &EmbedRequest) -> Result<EmbedResponse, Error> {
        let mut body = serde_json::to_value(request).map_err(serialization_error)?;
        if request.model.is_empty() {
            body["model"] = Value::from(self.config.default_model.as_str());
        }

        debug!(
            model = %body["model"],
            inputs = request.input.len(),
            "Ollama embed"
        );
        self.post(EMBED_PATH, &body).await
    }

    async fn post<R: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<R, Error> {
        let url = self.config.endpoint(path)?;
        let bytes = serde_json::to_vec(body).map_err(serialization_error)?;

        let mut request = reqwest::Request::new(Method::POST, url.clone());
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *request.body_mut() = Some(bytes.into());
        *request.timeout_mut() = Some(self.config.timeout);

        self.hooks.before(&mut request)?;
        let response = self.client.execute(request).await?;
        self.hooks.after(&response)?;

        if !response.is_success() {
            return Err(http_error(
                url.as_str(),
                response.status.as_u16(),
                response.body,
            ));
        }

        response.json()
    }
}

#[async_trait]
impl Transport for Ollama {
    async fn exchange(&self, request: &Request) -> Result<Response, Error> {
        self.chat(request).await
    }
}

impl fmt::Debug for Ollama {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ollama")
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

/// Builder for creating Ollama transports.
///
/// Unset fields come from `OLLAMA_HOST`, `OLLAMA_MODEL` and the defaults.
#[derive(Default)]
pub struct OllamaBuilder {
    config: Option<OllamaConfig>,
    host: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
    client: Option<Arc<dyn HttpClient>>,
    hooks: Hooks,
}

impl OllamaBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an explicit configuration instead of the environment
    pub fn config(mut self, config: OllamaConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the server URL or `host:port` address
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the default model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the exchange timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a custom HTTP client
    pub fn client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Add a request hook; request hooks run in registration order
    pub fn request_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.hooks.push_request(Arc::new(hook));
        self
    }

    /// Add a response hook; response hooks run in reverse registration order
    pub fn response_hook(mut self, hook: impl ResponseHook + 'static) -> Self {
        self.hooks.push_response(Arc::new(hook));
        self
    }

    /// Trace every request and response at `trace` level
    pub fn trace(self) -> Self {
        self.request_hook(TraceHook).response_hook(TraceHook)
    }

    /// Build the transport
    pub fn build(self) -> Result<Ollama, Error> {
        let mut config = self.config.unwrap_or_else(OllamaConfig::from_env);
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(model) = self.model {
            config.default_model = model;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        // Fail early on hosts that can never form a URL.
        config.endpoint(CHAT_PATH)?;

        let client = match self.client {
            Some(client) => client,
            None => Arc::new(ReqwestClient::new()?),
        };

        Ok(Ollama {
            config,
            client,
            hooks: self.hooks,
        })
    }
}
