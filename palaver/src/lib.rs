//! Palaver - expose typed Rust functions as tools to Ollama models
//!
//! Bind ordinary functions into tools, collect them in a toolkit and let the
//! conversation loop run the model's tool calls until it answers.
//!
//! # Quick Start
//!
//! ```no_run
//! use palaver::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, ToolParameters)]
//! #[tool(crate = "palaver::tools")]
//! struct Now {
//!     #[tool(description = "IANA timezone, UTC when omitted")]
//!     timezone: Optional<String>,
//! }
//!
//! fn now(q: Now) -> String {
//!     format!("12:00 in {}", q.timezone.unwrap_or("UTC".into()))
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let toolkit = Toolkit::new([BoundTool::builder()
//!     .func(now)
//!     .description("returns the current time in a timezone")
//!     .build()?])?;
//!
//! let client = Client::new(Ollama::from_env()?);
//! let request = Request::builder()
//!     .model("llama3.1")
//!     .temperature(0.0)
//!     .system("Use the provided tools to answer questions about time.")
//!     .user("What time is it in Dublin?")
//!     .build();
//!
//! let response = client.chat(request, Some(&toolkit)).await?;
//! println!("{}", response.content());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export core types
pub use palaver_core::*;

// Re-export feature-gated modules
#[cfg(feature = "providers")]
#[cfg_attr(docsrs, doc(cfg(feature = "providers")))]
pub mod providers {
    //! The Ollama transport
    pub use palaver_providers::*;
}

#[cfg(feature = "middleware")]
#[cfg_attr(docsrs, doc(cfg(feature = "middleware")))]
pub mod middleware {
    //! Middleware layers around transports
    pub use palaver_middleware::*;
}

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub mod tools {
    //! Tool binding and dispatch
    pub use palaver_tools::*;
}

#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub mod client {
    //! The conversation loop
    pub use palaver_client::*;
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use palaver_core::{
        Error, Message, Model, Request, Response, Role, ToolCall, ToolContext, Transport,
    };

    #[cfg(feature = "providers")]
    pub use palaver_providers::{Ollama, OllamaConfig};

    #[cfg(feature = "tools")]
    pub use palaver_tools::{BoundTool, Optional, Toolkit};

    #[cfg(feature = "derive")]
    pub use palaver_tools::ToolParameters;

    #[cfg(feature = "client")]
    pub use palaver_client::{ChatError, Client, LoopConfig, ToolErrorPolicy};
}
