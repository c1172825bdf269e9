//! Bound tools and the invoker that calls them

use crate::builder::ToolBuilder;
use crate::callable::{Handler, HandlerError};
use crate::error::{Result, ToolError};
use palaver_core::{ToolContext, ToolDescriptor};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use tracing::debug;

/// A tool the model can call
pub trait Tool: Send + Sync {
    /// The descriptor advertised to the model
    fn descriptor(&self) -> &ToolDescriptor;

    /// Call the tool with raw JSON arguments
    fn call(&self, ctx: &ToolContext, arguments: &Value) -> Result<Value>;

    /// The tool's name
    fn name(&self) -> &str {
        &self.descriptor().name
    }
}

/// A callable bound to its descriptor
pub struct BoundTool {
    descriptor: ToolDescriptor,
    handler: Handler,
    expects_context: bool,
    returns_errors: bool,
    // (advertised name, field name) for parameters renamed by fixups
    renames: Vec<(String, String)>,
}

impl BoundTool {
    /// Start building a tool
    pub fn builder() -> ToolBuilder {
        ToolBuilder::new()
    }

    pub(crate) fn new(
        descriptor: ToolDescriptor,
        handler: Handler,
        expects_context: bool,
        returns_errors: bool,
    ) -> Self {
        Self {
            descriptor,
            handler,
            expects_context,
            returns_errors,
            renames: Vec::new(),
        }
    }

    pub(crate) fn with_renames(mut self, renames: Vec<(String, String)>) -> Self {
        self.renames = renames;
        self
    }

    /// The descriptor advertised to the model
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Whether the function takes the context as its first argument
    pub fn expects_context(&self) -> bool {
        self.expects_context
    }

    /// Whether the function returns an error value
    pub fn returns_errors(&self) -> bool {
        self.returns_errors
    }

    /// Decode the arguments, call the function and encode its result
    pub fn call(&self, ctx: &ToolContext, arguments: &Value) -> Result<Value> {
        let tool = &self.descriptor.name;
        debug!(tool = %tool, "Invoking tool");

        let arguments = self.field_names(arguments);
        (self.handler)(ctx, &arguments).map_err(|err| match err {
            HandlerError::Decode(source) => ToolError::ArgumentDecode {
                tool: tool.clone(),
                source,
            },
            HandlerError::Invocation(message) => ToolError::Invocation {
                tool: tool.clone(),
                message,
            },
            HandlerError::Encode(source) => ToolError::ResultEncode {
                tool: tool.clone(),
                source,
            },
        })
    }
}

impl BoundTool {
    // Rewrites advertised argument names back to the struct's field names
    fn field_names<'a>(&self, arguments: &'a Value) -> Cow<'a, Value> {
        let object = match arguments {
            Value::Object(object) if !self.renames.is_empty() => object,
            _ => return Cow::Borrowed(arguments),
        };
        let renamed: Map<String, Value> = object
            .iter()
            .map(|(key, value)| {
                let field = self
                    .renames
                    .iter()
                    .find(|(advertised, _)| advertised == key)
                    .map_or(key, |(_, field)| field);
                (field.clone(), value.clone())
            })
            .collect();
        Cow::Owned(Value::Object(renamed))
    }
}

impl Tool for BoundTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn call(&self, ctx: &ToolContext, arguments: &Value) -> Result<Value> {
        BoundTool::call(self, ctx, arguments)
    }
}

impl fmt::Debug for BoundTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundTool")
            .field("descriptor", &self.descriptor)
            .field("expects_context", &self.expects_context)
            .field("returns_errors", &self.returns_errors)
            .finish()
    }
}
