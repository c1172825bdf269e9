//! Capability context handed to tools

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type Values = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Cancellation signal plus request-scoped values
///
/// One context is created per top-level chat call and passed to every tool
/// that asks for it. Clones share the same token and values.
#[derive(Clone, Default)]
pub struct ToolContext {
    cancellation: CancellationToken,
    values: Arc<Values>,
}

impl ToolContext {
    /// Create an empty context with a fresh token
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Attach a value, replacing any earlier value of the same type
    pub fn with_value<T: Any + Send + Sync>(mut self, value: T) -> Self {
        Arc::make_mut(&mut self.values).insert(TypeId::of::<T>(), Arc::new(value));
        self
    }

    /// Look up a value by type
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// The token that cancels this call
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Request cancellation of everything using this context
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// A child context, cancelled with this one but cancellable on its own
    pub fn child(&self) -> Self {
        Self {
            cancellation: self.cancellation.child_token(),
            values: Arc::clone(&self.values),
        }
    }
}

impl fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContext")
            .field("cancelled", &self.is_cancelled())
            .field("values", &self.values.len())
            .finish()
    }
}
