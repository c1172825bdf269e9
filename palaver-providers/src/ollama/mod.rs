//! Ollama transport

mod config;
mod provider;


pub use config::{host_url, OllamaConfig};
pub use provider::{Ollama, OllamaBuilder};
