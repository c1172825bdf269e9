//! Structured logging of chat exchanges

use crate::{BoxFuture, Layer, Service};
use palaver_core::{Error, Request, Response};
use std::time::Instant;
use tracing::{debug, debug_span, trace, warn, Instrument};

/// Layer that logs every exchange inside a `chat_exchange` span
///
/// Counts and timings go out at `debug`; failures at `warn`. With
/// [`with_content`](LoggingLayer::with_content) the message texts and tool
/// call names are added at `trace`.
#[derive(Debug, Clone, Default)]
pub struct LoggingLayer {
    log_content: bool,
}

impl LoggingLayer {
    /// Log counts and timings only
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log message contents
    pub fn with_content(mut self) -> Self {
        self.log_content = true;
        self
    }

    /// Whether message contents are logged
    pub fn logs_content(&self) -> bool {
        self.log_content
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingService {
            inner,
            log_content: self.log_content,
        }
    }
}

/// Service produced by [`LoggingLayer`]
#[derive(Debug, Clone)]
pub struct LoggingService<S> {
    inner: S,
    log_content: bool,
}

impl<S> Service<Request> for LoggingService<S>
where
    S: Service<Request, Response = Response, Error = Error>,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Error;
    type Future = BoxFuture<Result<Response, Error>>;

    fn call(&mut self, request: Request) -> Self::Future {
        let span = debug_span!("chat_exchange", model = %request.model);
        let log_content = self.log_content;

        span.in_scope(|| {
            debug!(
                messages = request.messages.len(),
                tools = request.tools.len(),
                "sending"
            );
            if log_content {
                for (index, message) in request.messages.iter().enumerate() {
                    trace!(
                        index,
                        role = ?message.role,
                        images = message.images.len(),
                        content = %message.content,
                        "message"
                    );
                }
            }
        });

        let started = Instant::now();
        let fut = self.inner.call(request);

        Box::pin(
            async move {
                let result = fut.await;
                let elapsed_ms = started.elapsed().as_millis() as u64;
                match &result {
                    Ok(response) => {
                        debug!(
                            elapsed_ms,
                            tool_calls = response.message.tool_calls.len(),
                            eval_count = ?response.eval_count,
                            done_reason = ?response.done_reason,
                            "received"
                        );
                        if log_content {
                            trace!(content = %response.message.content, "reply");
                            for call in &response.message.tool_calls {
                                trace!(tool = ?call.name(), "requested tool");
                            }
                        }
                    }
                    Err(error) => warn!(elapsed_ms, error = %error, "exchange failed"),
                }
                result
            }
            .instrument(span),
        )
    }
}
