//! Layers that wrap a chat [`Transport`]
//!
//! A [`Service`] takes a [`Request`] and yields a [`Response`]. Layers such
//! as [`RetryLayer`] and [`LoggingLayer`] wrap one service in another, and
//! `palaver_client::MiddlewareTransport` turns the finished stack back into
//! a transport for the conversation loop.

#![warn(missing_docs)]

use palaver_core::{Error, Request, Response, Transport};
use std::future::Future;
use std::pin::Pin;

pub mod logging;
pub mod retry;

// Re-export middleware implementations
pub use logging::{LoggingLayer, LoggingService};
pub use retry::{RetryConfig, RetryLayer, RetryService};

/// Future returned by the layers in this crate
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Something that answers chat requests, usually a transport plus layers
pub trait Service<R> {
    /// What a successful call yields
    type Response;
    /// What a failed call yields
    type Error;
    /// The pending call
    type Future: Future<Output = Result<Self::Response, Self::Error>> + Send;

    /// Start handling `request`
    fn call(&mut self, request: R) -> Self::Future;
}

/// Wraps one service in another
pub trait Layer<S> {
    /// The service that results
    type Service;

    /// Wrap `service`
    fn layer(&self, service: S) -> Self::Service;
}

/// The innermost service of a stack: one call, one exchange
#[derive(Clone)]
pub struct TransportService<T> {
    transport: T,
}

impl<T> TransportService<T> {
    /// Wrap a transport
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The wrapped transport
    pub fn get_ref(&self) -> &T {
        &self.transport
    }
}

impl<T> Service<Request> for TransportService<T>
where
    T: Transport + Clone + 'static,
{
    type Response = Response;
    type Error = Error;
    type Future = BoxFuture<Result<Response, Error>>;

    fn call(&mut self, request: Request) -> Self::Future {
        let transport = self.transport.clone();
        Box::pin(async move { transport.exchange(&request).await })
    }
}

/// Layering shortcuts available on every [`Transport`]
pub trait TransportExt: Transport + Sized {
    /// Turn the transport into the bottom of a stack
    fn into_service(self) -> TransportService<Self> {
        TransportService::new(self)
    }

    /// Wrap the transport in a single layer
    fn layer<L>(self, layer: L) -> L::Service
    where
        L: Layer<TransportService<Self>>,
    {
        layer.layer(self.into_service())
    }
}

impl<T: Transport> TransportExt for T {}

/// Two layers applied one after the other
pub struct Stack<Inner, Outer> {
    inner: Inner,
    outer: Outer,
}

impl<Inner, Outer> Stack<Inner, Outer> {
    /// `outer` wraps whatever `inner` produces
    pub fn new(inner: Inner, outer: Outer) -> Self {
        Self { inner, outer }
    }
}

impl<S, Inner, Outer> Layer<S> for Stack<Inner, Outer>
where
    Inner: Layer<S>,
    Outer: Layer<Inner::Service>,
{
    type Service = Outer::Service;

    fn layer(&self, service: S) -> Self::Service {
        let inner = self.inner.layer(service);
        self.outer.layer(inner)
    }
}

/// The empty layer
pub struct Identity;

impl<S> Layer<S> for Identity {
    type Service = S;

    fn layer(&self, service: S) -> Self::Service {
        service
    }
}

/// Builder for composing layers
///
/// Layers added later wrap the ones added earlier, so the last layer sees
/// each request first.
pub struct ServiceBuilder<L> {
    layer: L,
}

impl ServiceBuilder<Identity> {
    /// Start an empty stack
    pub fn new() -> Self {
        Self { layer: Identity }
    }
}

impl<L> ServiceBuilder<L> {
    /// Push a layer on top of the ones added so far
    pub fn layer<T>(self, layer: T) -> ServiceBuilder<Stack<L, T>> {
        ServiceBuilder {
            layer: Stack::new(self.layer, layer),
        }
    }

    /// Finish the stack over a transport
    pub fn transport<T>(self, transport: T) -> L::Service
    where
        L: Layer<TransportService<T>>,
    {
        self.layer.layer(TransportService::new(transport))
    }

    /// Finish the stack over an existing service
    pub fn service<S>(self, service: S) -> L::Service
    where
        L: Layer<S>,
    {
        self.layer.layer(service)
    }
}

impl Default for ServiceBuilder<Identity> {
    fn default() -> Self {
        Self::new()
    }
}
