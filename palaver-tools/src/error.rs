//! Error types for binding and dispatching tools

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// A descriptor invariant that does not hold after building
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The tool has no name and none could be inferred
    #[error("tool has no name")]
    MissingName,

    /// The tool has no description
    #[error("tool {tool:?} has no description")]
    MissingDescription {
        /// Tool name
        tool: String,
    },

    /// A property has an empty name
    #[error("tool {tool:?} has a parameter with no name")]
    UnnamedParameter {
        /// Tool name
        tool: String,
    },

    /// A property has no type
    #[error("missing type for parameter {parameter:?}")]
    MissingParameterType {
        /// Parameter name
        parameter: String,
    },

    /// A property has no description
    #[error("missing description for parameter {parameter:?}")]
    MissingParameterDescription {
        /// Parameter name
        parameter: String,
    },

    /// A required name does not match any property
    #[error("required parameter {parameter:?} is not defined")]
    UnknownRequired {
        /// Parameter name
        parameter: String,
    },
}

/// Why a callable could not become a tool
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// Inputs are not `()`, `(params)` or `(context, params)`
    #[error("bad input arity for tool {tool:?}")]
    InputArity {
        /// Tool name, if known
        tool: String,
    },

    /// Outputs are not `content` or `content, error`
    #[error("bad output arity for tool {tool:?}")]
    OutputArity {
        /// Tool name, if known
        tool: String,
    },

    /// The built descriptor is invalid
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// No callable was supplied to the builder
    #[error("tool {tool:?} has no function")]
    MissingFunction {
        /// Tool name, if known
        tool: String,
    },

    /// Two tools in one toolkit share a name
    #[error("duplicate tool name {name:?}")]
    DuplicateTool {
        /// The repeated name
        name: String,
    },
}

/// Error type for dispatching a tool call
#[derive(Debug)]
pub enum ToolError {
    /// Tool not found in the toolkit
    NotFound {
        /// Tool name that was not found
        name: String,
    },

    /// The call has no function part or an empty name
    MalformedCall,

    /// Arguments did not decode into the parameter type
    ArgumentDecode {
        /// Tool name
        tool: String,
        /// Underlying decode error
        source: serde_json::Error,
    },

    /// The tool returned an error
    Invocation {
        /// Tool name
        tool: String,
        /// The tool's error message
        message: String,
    },

    /// The tool's result could not be encoded
    ResultEncode {
        /// Tool name
        tool: String,
        /// Underlying encode error
        source: serde_json::Error,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// Tool not found
    NotFound,
    /// Malformed call
    MalformedCall,
    /// Argument decoding failed
    ArgumentDecode,
    /// The tool failed
    Invocation,
    /// Result encoding failed
    ResultEncode,
}

impl ToolError {
    /// Get the error kind
    pub fn kind(&self) -> ToolErrorKind {
        match self {
            ToolError::NotFound { .. } => ToolErrorKind::NotFound,
            ToolError::MalformedCall => ToolErrorKind::MalformedCall,
            ToolError::ArgumentDecode { .. } => ToolErrorKind::ArgumentDecode,
            ToolError::Invocation { .. } => ToolErrorKind::Invocation,
            ToolError::ResultEncode { .. } => ToolErrorKind::ResultEncode,
        }
    }

    /// Name of the tool involved, when there was one
    pub fn tool(&self) -> Option<&str> {
        match self {
            ToolError::NotFound { name } => Some(name),
            ToolError::MalformedCall => None,
            ToolError::ArgumentDecode { tool, .. }
            | ToolError::Invocation { tool, .. }
            | ToolError::ResultEncode { tool, .. } => Some(tool),
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::NotFound { name } => write!(f, "tool not found: {}", name),
            ToolError::MalformedCall => write!(f, "malformed tool call: missing function name"),
            ToolError::ArgumentDecode { tool, source } => {
                write!(f, "invalid arguments for tool '{}': {}", tool, source)
            }
            ToolError::Invocation { message, .. } => write!(f, "{}", message),
            ToolError::ResultEncode { tool, source } => {
                write!(f, "cannot encode result of tool '{}': {}", tool, source)
            }
        }
    }
}

impl StdError for ToolError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ToolError::ArgumentDecode { source, .. } | ToolError::ResultEncode { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

/// Result type for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;
