//! Request and response hooks around each HTTP exchange
//!
//! Request hooks run in registration order just before a request is sent and
//! may modify it, e.g. to add authentication headers. Response hooks run in
//! reverse registration order once the body has been read, so the first hook
//! registered sees the request first and the response last.

use crate::http::HttpResponse;
use palaver_core::Error;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Inspects or modifies an outgoing request
pub trait RequestHook: Send + Sync {
    /// Called before the request is sent; an error aborts the exchange
    fn on_request(&self, request: &mut reqwest::Request) -> Result<(), Error>;
}

/// Inspects a received response
pub trait ResponseHook: Send + Sync {
    /// Called before the status is checked; an error aborts the exchange
    fn on_response(&self, response: &HttpResponse) -> Result<(), Error>;
}

impl<F> RequestHook for F
where
    F: Fn(&mut reqwest::Request) -> Result<(), Error> + Send + Sync,
{
    fn on_request(&self, request: &mut reqwest::Request) -> Result<(), Error> {
        self(request)
    }
}

impl<F> ResponseHook for F
where
    F: Fn(&HttpResponse) -> Result<(), Error> + Send + Sync,
{
    fn on_response(&self, response: &HttpResponse) -> Result<(), Error> {
        self(response)
    }
}

/// An ordered pipeline of hooks
#[derive(Clone, Default)]
pub struct Hooks {
    request: Vec<Arc<dyn RequestHook>>,
    response: Vec<Arc<dyn ResponseHook>>,
}

impl Hooks {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request hook
    pub fn push_request(&mut self, hook: Arc<dyn RequestHook>) {
        self.request.push(hook);
    }

    /// Append a response hook
    pub fn push_response(&mut self, hook: Arc<dyn ResponseHook>) {
        self.response.push(hook);
    }

    /// Whether no hook is registered
    pub fn is_empty(&self) -> bool {
        self.request.is_empty() && self.response.is_empty()
    }

    pub(crate) fn before(&self, request: &mut reqwest::Request) -> Result<(), Error> {
        for hook in &self.request {
            hook.on_request(request).map_err(into_hook_error)?;
        }
        Ok(())
    }

    pub(crate) fn after(&self, response: &HttpResponse) -> Result<(), Error> {
        for hook in self.response.iter().rev() {
            hook.on_response(response).map_err(into_hook_error)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .finish()
    }
}

fn into_hook_error(error: Error) -> Error {
    match error {
        Error::Hook(_) => error,
        other => Error::Hook(other.to_string()),
    }
}

/// Traces requests and responses, bodies included, at `trace` level
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceHook;

impl RequestHook for TraceHook {
    fn on_request(&self, request: &mut reqwest::Request) -> Result<(), Error> {
        let body = request
            .body()
            .and_then(|body| body.as_bytes())
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        trace!(
            method = %request.method(),
            url = %request.url(),
            request = %body,
            "Sending Ollama request"
        );
        Ok(())
    }
}

impl ResponseHook for TraceHook {
    fn on_response(&self, response: &HttpResponse) -> Result<(), Error> {
        trace!(
            url = %response.url,
            status = response.status.as_u16(),
            response = %response.body,
            "Received Ollama response"
        );
        Ok(())
    }
}

/// Sets a header on every request
#[derive(Debug, Clone)]
pub struct HeaderHook {
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderHook {
    /// Create a hook for an arbitrary header
    pub fn new(name: &str, value: &str) -> Result<Self, Error> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
        Ok(Self { name, value })
    }

    /// Create a hook sending `Authorization: Bearer <token>`
    pub fn bearer(token: &str) -> Result<Self, Error> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| Error::Configuration(format!("Invalid API key: {}", e)))?;
        value.set_sensitive(true);
        Ok(Self {
            name: AUTHORIZATION,
            value,
        })
    }
}

impl RequestHook for HeaderHook {
    fn on_request(&self, request: &mut reqwest::Request) -> Result<(), Error> {
        request
            .headers_mut()
            .insert(self.name.clone(), self.value.clone());
        Ok(())
    }
}
