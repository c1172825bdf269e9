//! Tool descriptors and tool calls as they appear on the wire

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// The declared type of a tool parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// A JSON string
    String,
    /// A JSON number, integer or float
    Number,
    /// A JSON boolean
    Bool,
    /// A JSON array
    Array,
    /// A JSON object
    Object,
    /// Any other type name, e.g. `datetime`
    Custom(String),
}

impl PropertyType {
    /// The name sent to the model
    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Bool => "bool",
            PropertyType::Array => "array",
            PropertyType::Object => "object",
            PropertyType::Custom(name) => name,
        }
    }

    /// An empty custom type counts as no type at all
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl From<&str> for PropertyType {
    fn from(name: &str) -> Self {
        match name {
            "string" => PropertyType::String,
            "number" => PropertyType::Number,
            "bool" | "boolean" => PropertyType::Bool,
            "array" => PropertyType::Array,
            "object" => PropertyType::Object,
            other => PropertyType::Custom(other.to_string()),
        }
    }
}

impl From<String> for PropertyType {
    fn from(name: String) -> Self {
        PropertyType::from(name.as_str())
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PropertyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PropertyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(PropertyType::from)
    }
}

/// Schema of a single tool parameter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// The parameter type; unset only while a tool is being built
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PropertyType>,
    /// What the parameter means, for the model
    #[serde(default)]
    pub description: String,
    /// Allowed values, advertised but never enforced
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<String>,
}

impl PropertySchema {
    /// Create a property with a type and description
    pub fn new(kind: impl Into<PropertyType>, description: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            description: description.into(),
            enumeration: Vec::new(),
        }
    }
}

/// The model-facing description of a tool
///
/// Serialized in Ollama's `{"type": "function", "function": {...}}` envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireTool", into = "WireTool")]
pub struct ToolDescriptor {
    /// Tool name, unique within a toolkit
    pub name: String,
    /// What the tool does
    pub description: String,
    /// Parameters in declaration order
    pub properties: IndexMap<String, PropertySchema>,
    /// Names of parameters the model must supply
    pub required: Vec<String>,
}

impl ToolDescriptor {
    /// Look up a parameter by name
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.get(name)
    }

    /// Whether the named parameter is required
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

#[derive(Serialize, Deserialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    description: String,
    parameters: WireParameters,
}

#[derive(Serialize, Deserialize)]
struct WireParameters {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
    #[serde(default)]
    properties: IndexMap<String, PropertySchema>,
}

impl From<WireTool> for ToolDescriptor {
    fn from(wire: WireTool) -> Self {
        let WireFunction {
            name,
            description,
            parameters,
        } = wire.function;
        Self {
            name,
            description,
            properties: parameters.properties,
            required: parameters.required,
        }
    }
}

impl From<ToolDescriptor> for WireTool {
    fn from(tool: ToolDescriptor) -> Self {
        WireTool {
            kind: "function".to_string(),
            function: WireFunction {
                name: tool.name,
                description: tool.description,
                parameters: WireParameters {
                    kind: "object".to_string(),
                    required: tool.required,
                    properties: tool.properties,
                },
            },
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// The function part; a call without one is malformed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionCall>,
}

/// Name and arguments of a requested call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the tool to call
    #[serde(default)]
    pub name: String,
    /// Arguments as a JSON object
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    /// Create a call to the named function
    pub fn function(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            function: Some(FunctionCall {
                name: name.into(),
                arguments,
            }),
        }
    }

    /// Name of the called function, if present
    pub fn name(&self) -> Option<&str> {
        self.function.as_ref().map(|f| f.name.as_str())
    }
}
