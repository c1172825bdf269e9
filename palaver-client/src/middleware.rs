//! Middleware integration for the conversation loop

use async_trait::async_trait;
use palaver_core::{Error, Request, Response, Transport};
use palaver_middleware::Service;

/// A transport that wraps a middleware service
///
/// Lets a stack built with `palaver_middleware::ServiceBuilder` drive a
/// [`Client`](crate::Client). The service is cloned for every exchange
/// because services take `&mut self`.
#[derive(Debug, Clone)]
pub struct MiddlewareTransport<S> {
    service: S,
}

impl<S> MiddlewareTransport<S> {
    /// Create a new middleware transport from a service
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// The wrapped service
    pub fn get_ref(&self) -> &S {
        &self.service
    }
}

#[async_trait]
impl<S> Transport for MiddlewareTransport<S>
where
    S: Service<Request, Response = Response, Error = Error> + Clone + Send + Sync + 'static,
    S::Future: Send,
{
    async fn exchange(&self, request: &Request) -> Result<Response, Error> {
        let mut service = self.service.clone();
        service.call(request.clone()).await
    }
}
