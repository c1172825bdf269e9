//! Conversation loop settings

/// What the loop does when a tool call fails
///
/// In both cases the failure has already been appended to the conversation
/// as a `{"error": ...}` tool message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolErrorPolicy {
    /// Stop and return [`ChatError::Tool`](crate::ChatError::Tool)
    #[default]
    Abort,
    /// Log the failure and let the model react to the error message
    Continue,
}

/// Settings for [`Client`](crate::Client)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// Rounds of tool calls dispatched before giving up; `None` is unbounded
    pub max_rounds: Option<usize>,
    /// Reaction to failed tool calls
    pub on_tool_error: ToolErrorPolicy,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_rounds: Some(10),
            on_tool_error: ToolErrorPolicy::Abort,
        }
    }
}

impl LoopConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the rounds of tool calls
    pub fn max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    /// Remove the round cap
    pub fn unbounded(mut self) -> Self {
        self.max_rounds = None;
        self
    }

    /// Set the tool error policy
    pub fn on_tool_error(mut self, policy: ToolErrorPolicy) -> Self {
        self.on_tool_error = policy;
        self
    }
}
