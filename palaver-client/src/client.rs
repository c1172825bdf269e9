//! The conversation loop

use crate::config::{LoopConfig, ToolErrorPolicy};
use crate::error::ChatError;
use crate::hooks::{ConversationHook, HookFlow, Hooks};
use palaver_core::{Message, Model, Request, RequestBuilder, Response, ToolContext, Transport};
use palaver_tools::Toolkit;
use std::sync::Arc;
use tracing::{debug, warn};

/// Drives a conversation until the model stops calling tools
///
/// Each round sends the whole history through the transport. When the reply
/// carries tool calls, the assistant message is appended, every call is
/// dispatched in order through the toolkit and each result is appended as a
/// tool message before the next round. Hooks added with
/// [`with_hook`](Client::with_hook) then see the history and may rewrite it
/// or ask for another round.
///
/// # Examples
///
/// ```no_run
/// use palaver_client::Client;
/// use palaver_core::Request;
/// use palaver_providers::Ollama;
/// use palaver_tools::{BoundTool, Toolkit};
///
/// fn tick() -> u64 {
///     42
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let toolkit = Toolkit::new([BoundTool::builder()
///     .func(tick)
///     .description("reads the tick counter")
///     .build()?])?;
///
/// let client = Client::new(Ollama::from_env()?);
/// let request = Request::builder()
///     .model("llama3.2")
///     .user("What is the tick count?")
///     .build();
///
/// let response = client.chat(request, Some(&toolkit)).await?;
/// println!("{}", response);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client<T> {
    pub(crate) transport: T,
    pub(crate) config: LoopConfig,
    pub(crate) default_model: Option<Model>,
    pub(crate) hooks: Hooks,
}

impl<T: Transport> Client<T> {
    /// Create a client with the default loop settings
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: LoopConfig::default(),
            default_model: None,
            hooks: Hooks::default(),
        }
    }

    /// Replace the loop settings
    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the model for requests that do not name one
    pub fn with_model(mut self, model: impl Into<Model>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Run `hook` after every response, after the hooks added before it
    pub fn with_hook(mut self, hook: impl ConversationHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// The loop settings
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run a conversation with a fresh, never-cancelled context
    pub async fn chat(
        &self,
        request: Request,
        toolkit: Option<&Toolkit>,
    ) -> Result<Response, ChatError> {
        self.chat_with_context(request, toolkit, &ToolContext::new())
            .await
    }

    /// Run a conversation, passing `ctx` to tools and watching its cancellation
    ///
    /// Without a toolkit the first response is returned untouched, even if it
    /// asks for tool calls.
    pub async fn chat_with_context(
        &self,
        mut request: Request,
        toolkit: Option<&Toolkit>,
        ctx: &ToolContext,
    ) -> Result<Response, ChatError> {
        if request.model.is_empty() {
            if let Some(model) = &self.default_model {
                request.model = model.clone();
            }
        }
        if let Some(toolkit) = toolkit {
            let descriptors = toolkit
                .descriptors()
                .into_iter()
                .filter(|d| !request.tools.iter().any(|t| t.name == d.name))
                .collect::<Vec<_>>();
            request.tools.extend(descriptors);
        }

        let mut rounds = 0;
        loop {
            debug!(
                round = rounds + 1,
                messages = request.messages.len(),
                tools = request.tools.len(),
                "Sending conversation"
            );
            let response = self.exchange(&request, ctx).await?;

            let toolkit = toolkit.filter(|_| response.has_tool_calls());
            if toolkit.is_none() && self.hooks.is_empty() {
                debug!(rounds, "Conversation finished");
                return Ok(response);
            }

            if toolkit.is_some() && self.round_limit_reached(rounds) {
                warn!(rounds, "Round limit reached with tool calls pending");
                return Err(ChatError::RoundLimit {
                    rounds,
                    response: Box::new(response),
                    messages: request.messages,
                });
            }

            request.messages.push(response.message.clone());
            let mut flow = HookFlow::Done;
            if let Some(toolkit) = toolkit {
                flow = HookFlow::Continue;
                let calls = response.message.tool_calls.clone();
                for call in &calls {
                    if ctx.is_cancelled() {
                        return Err(ChatError::Cancelled);
                    }

                    let dispatch = toolkit.dispatch(ctx, call);
                    request.messages.push(dispatch.message);

                    if let Some(error) = dispatch.error {
                        match self.config.on_tool_error {
                            ToolErrorPolicy::Abort => {
                                return Err(ChatError::Tool {
                                    error,
                                    response: Box::new(response),
                                    messages: request.messages,
                                })
                            }
                            ToolErrorPolicy::Continue => {
                                debug!(tool = ?call.name(), "Continuing after tool error");
                            }
                        }
                    }
                }
            }

            match self.hooks.run(ctx, &mut request.messages, &response) {
                Ok(HookFlow::Continue) => flow = HookFlow::Continue,
                Ok(HookFlow::Done) => {}
                Err(error) => {
                    warn!(error = %error, "Conversation hook failed");
                    return Err(ChatError::Hook {
                        error,
                        response: Box::new(response),
                    });
                }
            }

            if flow == HookFlow::Done {
                debug!(rounds, "Conversation finished");
                return Ok(response);
            }
            if toolkit.is_none() && self.round_limit_reached(rounds) {
                warn!(rounds, "Round limit reached with a hook asking to continue");
                return Err(ChatError::RoundLimit {
                    rounds,
                    response: Box::new(response),
                    messages: request.messages,
                });
            }
            rounds += 1;
        }
    }

    fn round_limit_reached(&self, rounds: usize) -> bool {
        self.config.max_rounds.map_or(false, |max| rounds >= max)
    }

    /// Start a request for this client
    pub fn request(&self) -> ConnectedRequestBuilder<'_, T> {
        ConnectedRequestBuilder {
            client: self,
            builder: Request::builder(),
            toolkit: None,
            context: None,
        }
    }

    async fn exchange(&self, request: &Request, ctx: &ToolContext) -> Result<Response, ChatError> {
        let token = ctx.cancellation_token();
        if token.is_cancelled() {
            return Err(ChatError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Conversation cancelled during exchange");
                Err(ChatError::Cancelled)
            }
            result = self.transport.exchange(request) => match result {
                Ok(response) => Ok(response),
                Err(palaver_core::Error::Cancelled) => Err(ChatError::Cancelled),
                Err(error) => Err(error.into()),
            },
        }
    }
}

/// Request builder connected to a client
pub struct ConnectedRequestBuilder<'a, T> {
    client: &'a Client<T>,
    builder: RequestBuilder,
    toolkit: Option<&'a Toolkit>,
    context: Option<&'a ToolContext>,
}

impl<'a, T: Transport> ConnectedRequestBuilder<'a, T> {
    /// Set the model
    pub fn model(mut self, model: impl Into<Model>) -> Self {
        self.builder = self.builder.model(model);
        self
    }

    /// Add a system message
    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.builder = self.builder.system(content);
        self
    }

    /// Add a user message
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.builder = self.builder.user(content);
        self
    }

    /// Add an assistant message
    pub fn assistant(mut self, content: impl Into<String>) -> Self {
        self.builder = self.builder.assistant(content);
        self
    }

    /// Add any message
    pub fn message(mut self, message: Message) -> Self {
        self.builder = self.builder.message(message);
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.builder = self.builder.temperature(temperature);
        self
    }

    /// Ask for a JSON answer
    pub fn json(mut self) -> Self {
        self.builder = self.builder.json();
        self
    }

    /// Handle tool calls with this toolkit
    pub fn toolkit(mut self, toolkit: &'a Toolkit) -> Self {
        self.toolkit = Some(toolkit);
        self
    }

    /// Pass this context to tools and watch its cancellation
    pub fn context(mut self, ctx: &'a ToolContext) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Build the request without sending it
    pub fn build(self) -> Request {
        self.builder.build()
    }

    /// Run the conversation
    pub async fn send(self) -> Result<Response, ChatError> {
        let request = self.builder.build();
        match self.context {
            Some(ctx) => {
                self.client
                    .chat_with_context(request, self.toolkit, ctx)
                    .await
            }
            None => self.client.chat(request, self.toolkit).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::hook_fn;
    use crate::tests::{ScriptedTransport, Step};
    use palaver_core::{CancellationToken, Role, ToolCall};
    use palaver_tools::{BoundTool, ParameterField, ToolParameters};
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Deserialize)]
    struct Name {
        name: String,
    }

    impl ToolParameters for Name {
        fn parameters() -> Vec<ParameterField> {
            vec![ParameterField::new("name", "string").description("who to greet")]
        }
    }

    #[derive(Deserialize, palaver_tools::ToolParameters)]
    struct NoArgs {}

    fn hello(n: Name) -> Value {
        json!({ "hello": n.name })
    }

    fn toolkit() -> Toolkit {
        Toolkit::new([BoundTool::builder()
            .func(hello)
            .description("says hello")
            .build()
            .unwrap()])
        .unwrap()
    }

    fn call(name: &str, args: Value) -> Step {
        Step::Reply(Response::tool_calls([ToolCall::function(name, args)]))
    }

    fn answer(text: &str) -> Step {
        Step::Reply(Response::text(text))
    }

    #[tokio::test]
    async fn test_no_tool_calls_is_one_exchange() {
        let transport = ScriptedTransport::new([answer("hi there")]);
        let client = Client::new(transport.clone());

        let response = client
            .chat(Request::builder().user("hi").build(), Some(&toolkit()))
            .await
            .unwrap();

        assert_eq!(response, Response::text("hi there"));
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(transport.requests()[0].tools[0].name, "hello");
    }

    #[tokio::test]
    async fn test_tool_round_appends_history() {
        let transport = ScriptedTransport::new([
            call("hello", json!({ "name": "world" })),
            answer("done"),
        ]);
        let client = Client::new(transport.clone());

        let response = client
            .chat(Request::builder().user("greet the world").build(), Some(&toolkit()))
            .await
            .unwrap();
        assert_eq!(response.content(), "done");

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        let history = &requests[1].messages;
        let roles: Vec<_> = history.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool]);
        assert!(history[1].has_tool_calls());
        assert_eq!(history[2].content, r#"{"hello":"world"}"#);
    }

    #[tokio::test]
    async fn test_without_toolkit_calls_are_returned() {
        let transport = ScriptedTransport::new([call("hello", json!({ "name": "x" }))]);
        let client = Client::new(transport.clone());

        let response = client
            .chat(Request::builder().user("hi").build(), None)
            .await
            .unwrap();
        assert!(response.has_tool_calls());
        assert_eq!(transport.requests().len(), 1);
        assert!(transport.requests()[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_aborts_by_default() {
        let transport = ScriptedTransport::new([call("ghost", json!({})), answer("unreachable")]);
        let client = Client::new(transport.clone());

        let err = client
            .chat(Request::builder().user("hi").build(), Some(&toolkit()))
            .await
            .unwrap_err();

        match &err {
            ChatError::Tool {
                error,
                response,
                messages,
            } => {
                assert_eq!(error.to_string(), "tool not found: ghost");
                assert_eq!(response.message.tool_calls[0].name(), Some("ghost"));
                let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
                assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool]);
                assert!(messages[2].content.contains("tool not found: ghost"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_aborted_history_can_be_resumed() {
        let transport = ScriptedTransport::new([call("ghost", json!({})), answer("sorry")]);
        let client = Client::new(transport.clone());
        let kit = toolkit();

        let err = client
            .chat(Request::builder().user("hi").build(), Some(&kit))
            .await
            .unwrap_err();
        let history = err.messages().unwrap().to_vec();

        let mut request = Request::builder().build();
        request.messages = history;
        let response = client.chat(request, Some(&kit)).await.unwrap();
        assert_eq!(response.content(), "sorry");
        assert_eq!(transport.requests()[1].messages.len(), 3);
    }

    #[tokio::test]
    async fn test_hook_can_ask_for_another_round() {
        let transport = ScriptedTransport::new([answer(""), answer("in words")]);
        let client = Client::new(transport.clone()).with_hook(hook_fn(|_, history, response| {
            if response.content().is_empty() {
                history.push(Message::user("Please answer in words."));
                return Ok(HookFlow::Continue);
            }
            Ok(HookFlow::Done)
        }));

        let response = client
            .chat(Request::builder().user("hi").build(), None)
            .await
            .unwrap();
        assert_eq!(response.content(), "in words");

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        let roles: Vec<_> = requests[1].messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(requests[1].messages[2].content, "Please answer in words.");
    }

    #[tokio::test]
    async fn test_hooks_run_after_dispatch_in_order() {
        let transport = ScriptedTransport::new([
            call("hello", json!({ "name": "world" })),
            answer("done"),
        ]);
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (first, second) = (seen.clone(), seen.clone());
        let client = Client::new(transport.clone())
            .with_hook(hook_fn(move |_, history, _| {
                first.lock().unwrap().push(("first", history.len()));
                Ok(HookFlow::Done)
            }))
            .with_hook(hook_fn(move |_, history, _| {
                second.lock().unwrap().push(("second", history.len()));
                Ok(HookFlow::Done)
            }));

        let response = client
            .chat(Request::builder().user("hi").build(), Some(&toolkit()))
            .await
            .unwrap();
        assert_eq!(response.content(), "done");
        // user, assistant and tool message in the first round; a hook saying
        // Done does not stop the tool round
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("first", 3), ("second", 3), ("first", 4), ("second", 4)]
        );
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_hook_error_ends_the_chat() {
        let transport = ScriptedTransport::new([answer("hi"), answer("never")]);
        let client = Client::new(transport.clone())
            .with_hook(hook_fn(|_, _, _| Err("over budget".into())));

        let err = client
            .chat(Request::builder().user("hi").build(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Hook { .. }));
        assert_eq!(err.to_string(), "conversation hook failed: over budget");
        assert_eq!(err.response().unwrap().content(), "hi");
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_hook_continuation_is_capped() {
        let steps = (0..5).map(|i| answer(&i.to_string()));
        let transport = ScriptedTransport::new(steps);
        let client = Client::new(transport.clone())
            .with_config(LoopConfig::new().max_rounds(1))
            .with_hook(hook_fn(|_, _, _| Ok(HookFlow::Continue)));

        let err = client
            .chat(Request::builder().user("hi").build(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::RoundLimit { rounds: 1, .. }));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_continue_policy_lets_the_model_react() {
        let transport = ScriptedTransport::new([
            call("hello", json!({ "name": 5 })),
            call("hello", json!({ "name": "five" })),
            answer("fixed it"),
        ]);
        let client = Client::new(transport.clone())
            .with_config(LoopConfig::new().on_tool_error(ToolErrorPolicy::Continue));

        let response = client
            .chat(Request::builder().user("hi").build(), Some(&toolkit()))
            .await
            .unwrap();
        assert_eq!(response.content(), "fixed it");

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        let envelope: Value = serde_json::from_str(&requests[1].messages[2].content).unwrap();
        assert!(envelope["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid arguments for tool 'hello'"));
        assert_eq!(requests[2].messages[4].content, r#"{"hello":"five"}"#);
    }

    #[tokio::test]
    async fn test_round_limit() {
        let steps = (0..5).map(|_| call("hello", json!({ "name": "again" })));
        let transport = ScriptedTransport::new(steps);
        let client = Client::new(transport.clone()).with_config(LoopConfig::new().max_rounds(2));

        let err = client
            .chat(Request::builder().user("loop").build(), Some(&toolkit()))
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::RoundLimit { rounds: 2, .. }));
        assert!(err.response().unwrap().has_tool_calls());
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let transport = ScriptedTransport::new([
            Step::Fail(palaver_core::Error::Http {
                url: "http://localhost:11434/api/chat".into(),
                status: 503,
                body: String::new(),
            }),
            answer("never"),
        ]);
        let client = Client::new(transport.clone());

        let err = client
            .chat(Request::builder().user("hi").build(), Some(&toolkit()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChatError::Transport(palaver_core::Error::Http { status: 503, .. })
        ));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_exchange() {
        let transport = ScriptedTransport::new([answer("never")]);
        let client = Client::new(transport.clone());

        let token = CancellationToken::new();
        token.cancel();
        let ctx = ToolContext::new().with_cancellation(token);

        let err = client
            .chat_with_context(Request::builder().user("hi").build(), None, &ctx)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_exchange() {
        let transport = ScriptedTransport::new([Step::Hang]);
        let client = Client::new(transport.clone());
        let ctx = ToolContext::new();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = client
            .chat_with_context(Request::builder().user("hi").build(), Some(&toolkit()), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Cancelled));
    }

    #[tokio::test]
    async fn test_no_dispatch_after_cancellation() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let kit = Toolkit::new([BoundTool::builder()
            .name("stop")
            .description("cancels the conversation")
            .func(|ctx: &ToolContext, _: Name| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                ctx.cancel();
                "stopping"
            })
            .build()
            .unwrap()])
        .unwrap();

        let transport = ScriptedTransport::new([Step::Reply(Response::tool_calls([
            ToolCall::function("stop", json!({ "name": "a" })),
            ToolCall::function("stop", json!({ "name": "b" })),
        ]))]);
        let client = Client::new(transport);

        let err = client
            .chat_with_context(
                Request::builder().user("hi").build(),
                Some(&kit),
                &ToolContext::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Cancelled));
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_context_reaches_tools() {
        struct Tenant(&'static str);

        let kit = Toolkit::new([BoundTool::builder()
            .name("whoami")
            .description("reports the tenant")
            .func(|ctx: &ToolContext, _: NoArgs| {
                ctx.get::<Tenant>().map(|t| t.0).unwrap_or("nobody")
            })
            .build()
            .unwrap()])
        .unwrap();
        let transport = ScriptedTransport::new([call("whoami", Value::Null), answer("ok")]);
        let client = Client::new(transport.clone()).with_model("llama3.2");
        let ctx = ToolContext::new().with_value(Tenant("acme"));

        client
            .request()
            .user("who am I?")
            .toolkit(&kit)
            .context(&ctx)
            .send()
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].model.as_str(), "llama3.2");
        assert_eq!(requests[1].messages[2].content, r#""acme""#);
    }

    #[tokio::test]
    async fn test_shared_toolkit() {
        let kit = Arc::new(toolkit());
        let mut handles = Vec::new();
        for i in 0..4 {
            let kit = kit.clone();
            handles.push(tokio::spawn(async move {
                let transport = ScriptedTransport::new([
                    call("hello", json!({ "name": i.to_string() })),
                    answer("ok"),
                ]);
                let client = Client::new(transport.clone());
                client
                    .chat(Request::builder().user("hi").build(), Some(&*kit))
                    .await
                    .unwrap();
                transport.requests()[1].messages[2].content.clone()
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), format!(r#"{{"hello":"{}"}}"#, i));
        }
    }
}
