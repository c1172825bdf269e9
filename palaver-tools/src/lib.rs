//! Tool binding and dispatch for the Palaver tool-calling client
//!
//! This crate turns ordinary typed Rust functions into tools a model can
//! call. [`ToolBuilder`] binds a function and describes its parameters,
//! [`BoundTool`] decodes arguments and invokes it, and [`Toolkit`] routes
//! model-issued calls by name.
//!
//! ```rust,ignore
//! use palaver_tools::{BoundTool, Optional, ToolParameters, Toolkit};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, ToolParameters)]
//! struct Lookup {
//!     #[tool(description = "order number")]
//!     order_id: u64,
//!     #[tool(description = "include line items")]
//!     detailed: Optional<bool>,
//! }
//!
//! fn lookup_order(q: Lookup) -> anyhow::Result<Order> { /* ... */ }
//!
//! let toolkit = Toolkit::new([BoundTool::builder()
//!     .func(lookup_order)
//!     .description("finds an order by number")
//!     .build()?])?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod bound;
pub mod builder;
pub mod callable;
pub mod error;
pub mod optional;
pub mod schema;
pub mod toolkit;

// Re-export core types used in tool descriptors
pub use palaver_core::{PropertySchema, PropertyType, ToolCall, ToolContext, ToolDescriptor};

// Re-export main types
pub use bound::{BoundTool, Tool};
pub use builder::{to_lower_camel, ToolBuilder};
pub use callable::{
    Callable, FnCallable, Handler, HandlerError, Input, IntoToolOutput, Output, RawCallable,
    Signature, ToolFn,
};
pub use error::{BindError, ToolError, ToolErrorKind, ValidationError};
pub use optional::Optional;
pub use schema::{ParamType, ParameterField, ToolParameters};
pub use toolkit::{Dispatch, Toolkit, ToolkitBuilder};

#[cfg(feature = "derive")]
pub use palaver_derive::ToolParameters;
