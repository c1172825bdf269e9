//! Conversation loop for the Palaver tool-calling client
//!
//! [`Client`] sends a conversation through any [`palaver_core::Transport`],
//! dispatches the tool calls in each reply through a
//! [`palaver_tools::Toolkit`] and resubmits until the model gives a final
//! answer. [`ConversationHook`]s can inspect every response, rewrite the
//! history and ask for more rounds.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod builder;
mod client;
mod config;
mod error;
mod hooks;
mod middleware;

pub use builder::ClientBuilder;
pub use client::{Client, ConnectedRequestBuilder};
pub use config::{LoopConfig, ToolErrorPolicy};
pub use error::ChatError;
pub use hooks::{hook_fn, ConversationHook, FnHook, HookError, HookFlow};
pub use middleware::MiddlewareTransport;
pub use palaver_core::RequestBuilder;

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::{
        hook_fn, ChatError, Client, ConversationHook, HookFlow, LoopConfig, RequestBuilder,
        ToolErrorPolicy,
    };
    pub use palaver_core::{Message, Request, Response, Role, ToolContext};
    pub use palaver_tools::{BoundTool, Optional, Toolkit};
}
