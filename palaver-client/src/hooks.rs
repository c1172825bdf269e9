//! Hooks that run after every response of a conversation

use palaver_core::{Message, Response, ToolContext};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Error a hook may return to end the conversation
pub type HookError = Box<dyn StdError + Send + Sync>;

/// What a hook wants the loop to do next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HookFlow {
    /// Nothing more to send on this hook's account
    #[default]
    Done,
    /// Send the (possibly rewritten) history again
    Continue,
}

/// Reacts to a response before the loop decides whether to continue
///
/// `history` already ends with the response's assistant message, followed by
/// the tool messages of any calls the toolkit dispatched. A hook may append
/// to it, rewrite it or truncate it; whatever it leaves behind is what the
/// next round sends. The loop continues when the toolkit dispatched calls or
/// any hook answers [`HookFlow::Continue`].
pub trait ConversationHook: Send + Sync {
    /// Inspect the response and the history
    fn after_response(
        &self,
        ctx: &ToolContext,
        history: &mut Vec<Message>,
        response: &Response,
    ) -> Result<HookFlow, HookError>;
}

impl<H: ConversationHook + ?Sized> ConversationHook for Arc<H> {
    fn after_response(
        &self,
        ctx: &ToolContext,
        history: &mut Vec<Message>,
        response: &Response,
    ) -> Result<HookFlow, HookError> {
        (**self).after_response(ctx, history, response)
    }
}

/// A hook made from a closure, see [`hook_fn`]
#[derive(Clone)]
pub struct FnHook<F> {
    f: F,
}

/// Turn a closure into a [`ConversationHook`]
///
/// ```
/// use palaver_client::{hook_fn, HookFlow};
/// use palaver_core::Message;
///
/// // Ask once more whenever the model answers with nothing.
/// let nudge = hook_fn(|_, history, response| {
///     if response.content().is_empty() {
///         history.push(Message::user("Please answer in words."));
///         return Ok(HookFlow::Continue);
///     }
///     Ok(HookFlow::Done)
/// });
/// # let _ = nudge;
/// ```
pub fn hook_fn<F>(f: F) -> FnHook<F>
where
    F: Fn(&ToolContext, &mut Vec<Message>, &Response) -> Result<HookFlow, HookError>
        + Send
        + Sync,
{
    FnHook { f }
}

impl<F> ConversationHook for FnHook<F>
where
    F: Fn(&ToolContext, &mut Vec<Message>, &Response) -> Result<HookFlow, HookError>
        + Send
        + Sync,
{
    fn after_response(
        &self,
        ctx: &ToolContext,
        history: &mut Vec<Message>,
        response: &Response,
    ) -> Result<HookFlow, HookError> {
        (self.f)(ctx, history, response)
    }
}

impl<F> fmt::Debug for FnHook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHook").finish_non_exhaustive()
    }
}

/// Hooks in registration order
#[derive(Clone, Default)]
pub(crate) struct Hooks(Vec<Arc<dyn ConversationHook>>);

impl Hooks {
    pub(crate) fn push(&mut self, hook: Arc<dyn ConversationHook>) {
        self.0.push(hook);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Run every hook; the first error stops the rest
    pub(crate) fn run(
        &self,
        ctx: &ToolContext,
        history: &mut Vec<Message>,
        response: &Response,
    ) -> Result<HookFlow, HookError> {
        let mut flow = HookFlow::Done;
        for hook in &self.0 {
            if hook.after_response(ctx, history, response)? == HookFlow::Continue {
                flow = HookFlow::Continue;
            }
        }
        Ok(flow)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").field("len", &self.0.len()).finish()
    }
}
