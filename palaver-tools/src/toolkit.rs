//! A fixed set of tools, dispatched by name

use crate::bound::{BoundTool, Tool};
use crate::error::{BindError, ToolError};
use palaver_core::{Message, ToolCall, ToolContext, ToolDescriptor};
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// The outcome of dispatching one call
#[derive(Debug)]
pub struct Dispatch {
    /// Tool-role message to append to the conversation
    pub message: Message,
    /// The failure, when the message carries an error envelope
    pub error: Option<ToolError>,
}

impl Dispatch {
    /// Whether the call succeeded
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Tools in registration order with a name index
///
/// Built once and never mutated, so it can be shared between conversations
/// behind an `Arc` without locking.
#[derive(Clone, Default)]
pub struct Toolkit {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl Toolkit {
    /// Create a toolkit from bound tools; names must be unique
    pub fn new(tools: impl IntoIterator<Item = BoundTool>) -> Result<Self, BindError> {
        tools
            .into_iter()
            .fold(Self::builder(), |builder, tool| builder.tool(tool))
            .build()
    }

    /// Create a toolkit builder
    pub fn builder() -> ToolkitBuilder {
        ToolkitBuilder::default()
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Tools in registration order
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Descriptors in registration order, for outgoing requests
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor().clone()).collect()
    }

    /// Get the number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the toolkit is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Route a call to its tool and render the outcome as a tool message
    ///
    /// Failures become `{"error": "..."}` content so the model can react;
    /// the error is also returned for the caller to act on.
    pub fn dispatch(&self, ctx: &ToolContext, call: &ToolCall) -> Dispatch {
        match self.try_dispatch(ctx, call) {
            Ok(content) => Dispatch {
                message: Message::tool(content),
                error: None,
            },
            Err(error) => {
                warn!(
                    tool = error.tool().unwrap_or_default(),
                    error = %error,
                    "Tool call failed"
                );
                Dispatch {
                    message: Message::tool(json!({ "error": error.to_string() }).to_string()),
                    error: Some(error),
                }
            }
        }
    }

    fn try_dispatch(&self, ctx: &ToolContext, call: &ToolCall) -> Result<String, ToolError> {
        let function = match &call.function {
            Some(function) if !function.name.is_empty() => function,
            _ => return Err(ToolError::MalformedCall),
        };
        let tool = self
            .get(&function.name)
            .ok_or_else(|| ToolError::NotFound {
                name: function.name.clone(),
            })?;

        debug!(tool = %function.name, "Dispatching tool call");
        let value = tool.call(ctx, &function.arguments)?;
        Ok(value.to_string())
    }
}

impl fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|t| t.name()))
            .finish()
    }
}

/// Builder for [`Toolkit`]
#[derive(Default)]
pub struct ToolkitBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolkitBuilder {
    /// Add a bound tool
    pub fn tool(self, tool: BoundTool) -> Self {
        self.shared(Arc::new(tool))
    }

    /// Add any tool implementation
    pub fn shared(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Build the toolkit, rejecting repeated names
    pub fn build(self) -> Result<Toolkit, BindError> {
        let mut index = HashMap::with_capacity(self.tools.len());
        for (i, tool) in self.tools.iter().enumerate() {
            if index.insert(tool.name().to_string(), i).is_some() {
                return Err(BindError::DuplicateTool {
                    name: tool.name().to_string(),
                });
            }
        }
        Ok(Toolkit {
            tools: self.tools,
            index,
        })
    }
}
