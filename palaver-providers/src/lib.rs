//! Ollama transport for the Palaver tool-calling client
//!
//! [`Ollama`] implements [`palaver_core::Transport`] over the Ollama HTTP API.
//! Requests pass through an ordered pipeline of [`hooks`] and an exchangeable
//! [`HttpClient`].

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config_builder;
pub mod constants;
pub mod error;
pub mod hooks;
pub mod http;
pub mod ollama;

pub use config_builder::OllamaConfigBuilder;
pub use hooks::{HeaderHook, Hooks, RequestHook, ResponseHook, TraceHook};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use ollama::{Ollama, OllamaBuilder, OllamaConfig};
