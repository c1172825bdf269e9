//! Builder for configuring a client

use crate::client::Client;
use crate::config::{LoopConfig, ToolErrorPolicy};
use crate::hooks::{ConversationHook, Hooks};
use crate::middleware::MiddlewareTransport;
use palaver_core::{Model, Transport};
use std::sync::Arc;

/// Builder for [`Client`]
///
/// # Examples
///
/// ```
/// use palaver_client::{ClientBuilder, ToolErrorPolicy};
///
/// let builder = ClientBuilder::new()
///     .model("llama3.2")
///     .max_rounds(4)
///     .on_tool_error(ToolErrorPolicy::Continue);
/// assert_eq!(builder.config().max_rounds, Some(4));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: LoopConfig,
    model: Option<Model>,
    hooks: Hooks,
}

impl ClientBuilder {
    /// Create a new client builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model for requests that do not name one
    pub fn model(mut self, model: impl Into<Model>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Cap the rounds of tool calls
    pub fn max_rounds(mut self, rounds: usize) -> Self {
        self.config.max_rounds = Some(rounds);
        self
    }

    /// Let the model call tools for as long as it wants
    pub fn unbounded(mut self) -> Self {
        self.config.max_rounds = None;
        self
    }

    /// Set the reaction to failed tool calls
    pub fn on_tool_error(mut self, policy: ToolErrorPolicy) -> Self {
        self.config.on_tool_error = policy;
        self
    }

    /// Run `hook` after every response
    pub fn hook(mut self, hook: impl ConversationHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// The loop settings so far
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Build a client around a transport
    pub fn build<T: Transport>(self, transport: T) -> Client<T> {
        Client {
            transport,
            config: self.config,
            default_model: self.model,
            hooks: self.hooks,
        }
    }

    /// Build a client around a middleware service
    pub fn build_with_service<S>(self, service: S) -> Client<MiddlewareTransport<S>>
    where
        MiddlewareTransport<S>: Transport,
    {
        self.build(MiddlewareTransport::new(service))
    }
}

impl Client<()> {
    /// Create a client builder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}
