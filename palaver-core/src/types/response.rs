//! Chat response types

use crate::types::message::{Message, Role};
use crate::types::tool::ToolCall;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A complete, non-streamed response from `/api/chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Model that produced the response
    #[serde(default)]
    pub model: String,
    /// When the server produced the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// The assistant message, possibly carrying tool calls
    pub message: Message,
    /// Whether generation finished
    #[serde(default)]
    pub done: bool,
    /// Why generation stopped, e.g. `stop`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    /// Total time spent, in nanoseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    /// Time spent loading the model, in nanoseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    /// Tokens in the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Time spent on the prompt, in nanoseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,
    /// Tokens generated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
    /// Time spent generating, in nanoseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

impl Response {
    /// Create a finished response carrying the given message
    pub fn new(message: Message) -> Self {
        Self {
            model: String::new(),
            created_at: None,
            message,
            done: true,
            done_reason: None,
            total_duration: None,
            load_duration: None,
            prompt_eval_count: None,
            prompt_eval_duration: None,
            eval_count: None,
            eval_duration: None,
        }
    }

    /// Create a simple text response
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(Message::text(Role::Assistant, content))
    }

    /// Create a response requesting tool calls
    pub fn tool_calls(calls: impl IntoIterator<Item = ToolCall>) -> Self {
        Self::new(Message::assistant("").with_tool_calls(calls))
    }

    /// The generated text
    pub fn content(&self) -> &str {
        &self.message.content
    }

    /// Check if the response contains tool calls
    pub fn has_tool_calls(&self) -> bool {
        self.message.has_tool_calls()
    }

    /// Total server-side duration
    pub fn total_duration(&self) -> Option<Duration> {
        self.total_duration.map(Duration::from_nanos)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message.content)?;
        if self.has_tool_calls() {
            write!(f, " [+{} tool calls]", self.message.tool_calls.len())?;
        }
        Ok(())
    }
}
