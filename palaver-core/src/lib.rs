//! Core traits and types for the Palaver tool-calling client
//!
//! This crate provides the Ollama wire types, the [`Transport`] seam and the
//! [`ToolContext`] handed to tools. Every other Palaver crate builds on it.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod context;
pub mod error;
pub mod transport;
pub mod types;

// Re-export commonly used items
pub use context::ToolContext;
pub use error::{Error, Result};
pub use transport::Transport;
pub use types::{
    embed::{EmbedRequest, EmbedResponse},
    message::{Image, Message, Role},
    request::{Model, Request, RequestBuilder},
    response::Response,
    tool::{FunctionCall, PropertySchema, PropertyType, ToolCall, ToolDescriptor},
};

/// Re-exported so callers can build contexts without depending on tokio-util
pub use tokio_util::sync::CancellationToken;
