//! Chat request types

use crate::types::message::Message;
use crate::types::tool::ToolDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A model identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Model(pub String);

impl Model {
    /// Create a new model identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// An empty model lets the transport pick its default
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Model {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chat request, serialized as the body of `/api/chat`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The model to use
    pub model: Model,
    /// The conversation so far
    pub messages: Vec<Message>,
    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDescriptor>,
    /// Output format, `"json"` or a JSON schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    /// Model options such as `temperature`
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    /// How long the model stays loaded, e.g. `"5m"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
    /// Always false; responses are never streamed
    #[serde(default)]
    pub stream: bool,
}

impl Request {
    /// Create a new request builder
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Create a simple request with just messages
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    /// Check if the request advertises tools
    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }
}

/// Builder for [`Request`]
#[derive(Debug, Default)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Set the model
    pub fn model(mut self, model: impl Into<Model>) -> Self {
        self.request.model = model.into();
        self
    }

    /// Add a message
    pub fn message(mut self, message: Message) -> Self {
        self.request.messages.push(message);
        self
    }

    /// Add multiple messages
    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.request.messages.extend(messages);
        self
    }

    /// Add a system message
    pub fn system(self, text: impl Into<String>) -> Self {
        self.message(Message::system(text))
    }

    /// Add a user message
    pub fn user(self, text: impl Into<String>) -> Self {
        self.message(Message::user(text))
    }

    /// Add an assistant message
    pub fn assistant(self, text: impl Into<String>) -> Self {
        self.message(Message::assistant(text))
    }

    /// Advertise a tool without handling its calls
    pub fn tool(mut self, tool: ToolDescriptor) -> Self {
        self.request.tools.push(tool);
        self
    }

    /// Advertise multiple tools
    pub fn tools(mut self, tools: impl IntoIterator<Item = ToolDescriptor>) -> Self {
        self.request.tools.extend(tools);
        self
    }

    /// Set a model option
    pub fn option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request.options.insert(name.into(), value.into());
        self
    }

    /// Set the sampling temperature
    pub fn temperature(self, temperature: f32) -> Self {
        self.option("temperature", temperature)
    }

    /// Ask for JSON output
    pub fn json(mut self) -> Self {
        self.request.format = Some(Value::String("json".to_string()));
        self
    }

    /// Constrain output to a JSON schema
    pub fn format(mut self, schema: Value) -> Self {
        self.request.format = Some(schema);
        self
    }

    /// Set how long the model stays loaded after the request
    pub fn keep_alive(mut self, duration: impl Into<String>) -> Self {
        self.request.keep_alive = Some(duration.into());
        self
    }

    /// Build the request
    pub fn build(self) -> Request {
        self.request
    }
}
