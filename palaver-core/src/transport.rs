//! The transport seam between the conversation loop and a model server

use crate::error::Result;
use crate::types::request::Request;
use crate::types::response::Response;
use async_trait::async_trait;
use std::sync::Arc;

/// One request/response exchange with a model server
///
/// Implementations must be safe to call from many tasks at once. The
/// conversation loop never retries an exchange; wrap the transport in a retry
/// layer for that.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submit the full request and wait for the complete response
    async fn exchange(&self, request: &Request) -> Result<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn exchange(&self, request: &Request) -> Result<Response> {
        (**self).exchange(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn exchange(&self, request: &Request) -> Result<Response> {
        (**self).exchange(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::message::Message;

    struct Echo;

    #[async_trait]
    impl Transport for Echo {
        async fn exchange(&self, request: &Request) -> Result<Response> {
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(Response::text(last))
        }
    }

    #[tokio::test]
    async fn test_shared_transport() {
        let transport: Arc<dyn Transport> = Arc::new(Echo);
        let request = Request::new(vec![Message::user("ping")]);

        let response = transport.exchange(&request).await.unwrap();
        assert_eq!(response.content(), "ping");

        let boxed: Box<dyn Transport> = Box::new(Echo);
        assert_eq!(boxed.exchange(&request).await.unwrap().content(), "ping");
    }
}
