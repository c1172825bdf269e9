//! Callables that can be bound as tools
//!
//! A [`Callable`] reports its [`Signature`] and parameters and turns itself
//! into a type-erased [`Handler`]. Plain functions and closures become
//! callables through [`ToolFn`]; [`RawCallable`] covers functions whose shape
//! is only known at runtime.

use crate::schema::{ParameterField, ToolParameters};
use palaver_core::ToolContext;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// One input of a callable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// The [`ToolContext`]
    Context,
    /// The structured arguments
    Parameters,
}

/// One output of a callable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// The content returned to the model
    Content,
    /// A secondary error value
    Error,
}

/// The inputs and outputs of a callable, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Ordered inputs
    pub inputs: Vec<Input>,
    /// Ordered outputs
    pub outputs: Vec<Output>,
}

impl Signature {
    /// Build a signature from its parts
    pub fn new(inputs: Vec<Input>, outputs: Vec<Output>) -> Self {
        Self { inputs, outputs }
    }

    /// Whether the first input is the context
    pub fn expects_context(&self) -> bool {
        self.inputs.first() == Some(&Input::Context)
    }

    /// Whether the callable returns an error value
    pub fn returns_errors(&self) -> bool {
        self.outputs.last() == Some(&Output::Error)
    }
}

/// How a handler call failed, before the tool name is attached
#[derive(Debug)]
pub enum HandlerError {
    /// Arguments did not decode
    Decode(serde_json::Error),
    /// The function returned an error
    Invocation(String),
    /// The result did not encode
    Encode(serde_json::Error),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Decode(err) => write!(f, "decode: {}", err),
            HandlerError::Invocation(msg) => write!(f, "{}", msg),
            HandlerError::Encode(err) => write!(f, "encode: {}", err),
        }
    }
}

impl std::error::Error for HandlerError {}

/// The uniform entry point every bound tool is reduced to
pub type Handler =
    Arc<dyn Fn(&ToolContext, &Value) -> Result<Value, HandlerError> + Send + Sync>;

/// Something that can be bound as a tool
pub trait Callable: Send + Sync + 'static {
    /// Inputs and outputs, checked when the tool is built
    fn signature(&self) -> Signature;

    /// The callable's own name, if it has a usable one
    fn name(&self) -> Option<String> {
        None
    }

    /// Parameters of the structured argument
    fn parameters(&self) -> Vec<ParameterField>;

    /// Erase the callable into its entry point
    fn into_handler(self) -> Handler
    where
        Self: Sized;
}

/// Marker for outputs that are plain content
pub struct Plain;

/// Marker for outputs that are `Result<content, error>`
pub struct Fallible;

/// A function return value that can become tool content
///
/// Implemented for any `T: Serialize` and for `Result<T, E>` where the error
/// is `Display` but not itself `Serialize`.
pub trait IntoToolOutput<M> {
    /// Outputs this return type stands for
    fn outputs() -> Vec<Output>;

    /// Encode the value
    fn into_tool_output(self) -> Result<Value, HandlerError>;
}

impl<T: Serialize> IntoToolOutput<Plain> for T {
    fn outputs() -> Vec<Output> {
        vec![Output::Content]
    }

    fn into_tool_output(self) -> Result<Value, HandlerError> {
        serde_json::to_value(&self).map_err(HandlerError::Encode)
    }
}

impl<T: Serialize, E: fmt::Display> IntoToolOutput<Fallible> for Result<T, E> {
    fn outputs() -> Vec<Output> {
        vec![Output::Content, Output::Error]
    }

    fn into_tool_output(self) -> Result<Value, HandlerError> {
        match self {
            Ok(content) => serde_json::to_value(&content).map_err(HandlerError::Encode),
            Err(err) => Err(HandlerError::Invocation(err.to_string())),
        }
    }
}

/// A Rust function usable as a tool
///
/// Implemented for `Fn() -> O`, `Fn(P) -> O` and `Fn(&ToolContext, P) -> O`
/// where `P` is a [`ToolParameters`] struct and `O` is [`IntoToolOutput`].
pub trait ToolFn<Args, M>: Send + Sync + Sized + 'static {
    /// Inputs and outputs of the function
    fn signature() -> Signature;

    /// Parameters of its structured argument
    fn parameters() -> Vec<ParameterField>;

    /// Decode arguments, call, and encode the result
    fn invoke(&self, ctx: &ToolContext, args: &Value) -> Result<Value, HandlerError>;
}

fn decode<P: DeserializeOwned>(args: &Value) -> Result<P, HandlerError> {
    // A call without arguments decodes like an empty object.
    if args.is_null() {
        return P::deserialize(&Value::Object(Map::new())).map_err(HandlerError::Decode);
    }
    P::deserialize(args).map_err(HandlerError::Decode)
}

impl<F, O, M> ToolFn<(), M> for F
where
    F: Fn() -> O + Send + Sync + 'static,
    O: IntoToolOutput<M>,
{
    fn signature() -> Signature {
        Signature::new(Vec::new(), O::outputs())
    }

    fn parameters() -> Vec<ParameterField> {
        Vec::new()
    }

    fn invoke(&self, _ctx: &ToolContext, _args: &Value) -> Result<Value, HandlerError> {
        (self)().into_tool_output()
    }
}

impl<F, P, O, M> ToolFn<(P,), M> for F
where
    F: Fn(P) -> O + Send + Sync + 'static,
    P: ToolParameters + DeserializeOwned,
    O: IntoToolOutput<M>,
{
    fn signature() -> Signature {
        Signature::new(vec![Input::Parameters], O::outputs())
    }

    fn parameters() -> Vec<ParameterField> {
        P::parameters()
    }

    fn invoke(&self, _ctx: &ToolContext, args: &Value) -> Result<Value, HandlerError> {
        let params = decode::<P>(args)?;
        (self)(params).into_tool_output()
    }
}

impl<F, P, O, M> ToolFn<(ToolContext, P), M> for F
where
    F: Fn(&ToolContext, P) -> O + Send + Sync + 'static,
    P: ToolParameters + DeserializeOwned,
    O: IntoToolOutput<M>,
{
    fn signature() -> Signature {
        Signature::new(vec![Input::Context, Input::Parameters], O::outputs())
    }

    fn parameters() -> Vec<ParameterField> {
        P::parameters()
    }

    fn invoke(&self, ctx: &ToolContext, args: &Value) -> Result<Value, HandlerError> {
        let params = decode::<P>(args)?;
        (self)(ctx, params).into_tool_output()
    }
}

/// A [`ToolFn`] viewed as a [`Callable`]
pub struct FnCallable<F, Args, M> {
    func: F,
    _marker: PhantomData<fn() -> (Args, M)>,
}

impl<F, Args, M> FnCallable<F, Args, M>
where
    F: ToolFn<Args, M>,
{
    /// Wrap a function
    pub fn new(func: F) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}

impl<F, Args, M> Callable for FnCallable<F, Args, M>
where
    F: ToolFn<Args, M>,
    Args: 'static,
    M: 'static,
{
    fn signature(&self) -> Signature {
        F::signature()
    }

    fn name(&self) -> Option<String> {
        function_name(std::any::type_name::<F>())
    }

    fn parameters(&self) -> Vec<ParameterField> {
        F::parameters()
    }

    fn into_handler(self) -> Handler {
        let func = self.func;
        Arc::new(move |ctx, args| func.invoke(ctx, args))
    }
}

/// Reduce a type name such as `app::tools::get_weather` to `get_weather`
///
/// Closures and other anonymous types have no usable name.
pub(crate) fn function_name(type_name: &str) -> Option<String> {
    if type_name.contains('{') {
        return None;
    }
    let base = type_name.split('<').next().unwrap_or(type_name);
    let name = base.rsplit("::").next().unwrap_or(base);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// A callable assembled at runtime from an explicit signature
///
/// Used for functions whose arity is not known statically, such as scripted
/// or foreign functions. The signature is checked when the tool is built.
pub struct RawCallable {
    signature: Signature,
    name: Option<String>,
    parameters: Vec<ParameterField>,
    handler: Handler,
}

impl RawCallable {
    /// Create a callable from a signature and entry point
    pub fn new<F>(signature: Signature, handler: F) -> Self
    where
        F: Fn(&ToolContext, &Value) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        Self {
            signature,
            name: None,
            parameters: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Give the callable a name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare a parameter
    pub fn parameter(mut self, field: ParameterField) -> Self {
        self.parameters.push(field);
        self
    }
}

impl Callable for RawCallable {
    fn signature(&self) -> Signature {
        self.signature.clone()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn parameters(&self) -> Vec<ParameterField> {
        self.parameters.clone()
    }

    fn into_handler(self) -> Handler {
        self.handler
    }
}
