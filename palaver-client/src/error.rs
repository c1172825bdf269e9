//! Errors ending a conversation

use crate::hooks::HookError;
use palaver_core::{Message, Response};
use palaver_tools::ToolError;
use thiserror::Error;

/// Why a chat did not produce a final answer
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatError {
    /// The transport failed; the loop never retries
    #[error(transparent)]
    Transport(#[from] palaver_core::Error),

    /// A tool call failed under [`ToolErrorPolicy::Abort`](crate::ToolErrorPolicy::Abort)
    #[error("tool call failed: {error}")]
    Tool {
        /// The dispatch failure
        #[source]
        error: ToolError,
        /// The response that requested the failing call
        response: Box<Response>,
        /// The conversation so far, ending with the failure's tool message
        messages: Vec<Message>,
    },

    /// A conversation hook returned an error
    #[error("conversation hook failed: {error}")]
    Hook {
        /// What the hook reported
        #[source]
        error: HookError,
        /// The response the hook was looking at
        response: Box<Response>,
    },

    /// The context was cancelled
    #[error("chat cancelled")]
    Cancelled,

    /// The model was still calling tools when the round cap was reached
    #[error("model still calling tools after {rounds} rounds")]
    RoundLimit {
        /// Rounds of tool calls that were dispatched
        rounds: usize,
        /// The last response, with undispatched tool calls
        response: Box<Response>,
        /// The conversation sent in the last round
        messages: Vec<Message>,
    },
}

impl ChatError {
    /// The last response received, when the error carries one
    pub fn response(&self) -> Option<&Response> {
        match self {
            ChatError::Tool { response, .. }
            | ChatError::Hook { response, .. }
            | ChatError::RoundLimit { response, .. } => Some(&**response),
            _ => None,
        }
    }

    /// The conversation history when the loop stopped, if it was kept
    ///
    /// After a [`ChatError::Tool`] it can be resubmitted as it is to let the
    /// model see the error.
    pub fn messages(&self) -> Option<&[Message]> {
        match self {
            ChatError::Tool { messages, .. } | ChatError::RoundLimit { messages, .. } => {
                Some(messages)
            }
            _ => None,
        }
    }

    /// The tool failure, for [`ChatError::Tool`]
    pub fn tool_error(&self) -> Option<&ToolError> {
        match self {
            ChatError::Tool { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Whether the chat was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            ChatError::Cancelled | ChatError::Transport(palaver_core::Error::Cancelled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_messages() {
        let err = ChatError::Tool {
            error: ToolError::NotFound {
                name: "ghost".into(),
            },
            response: Box::new(Response::text("")),
            messages: vec![Message::user("hi")],
        };
        assert_eq!(err.to_string(), "tool call failed: tool not found: ghost");
        assert!(err.source().is_some());
        assert!(err.response().is_some());
        assert_eq!(err.messages().map(<[Message]>::len), Some(1));

        let err = ChatError::Hook {
            error: "budget exceeded".into(),
            response: Box::new(Response::text("")),
        };
        assert_eq!(err.to_string(), "conversation hook failed: budget exceeded");
        assert!(err.source().is_some());
        assert!(err.messages().is_none());

        let err: ChatError = palaver_core::Error::Timeout.into();
        assert_eq!(err.to_string(), "Operation timed out");
        assert!(err.response().is_none());

        assert!(ChatError::Cancelled.is_cancelled());
        assert!(ChatError::from(palaver_core::Error::Cancelled).is_cancelled());
    }
}
