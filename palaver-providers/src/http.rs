//! HTTP client abstraction

use crate::error::{network_error, serialization_error};
use palaver_core::Error;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// A response whose body has been read to the end
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL of the request
    pub url: String,
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as text
    pub body: String,
}

impl HttpResponse {
    /// Create a response, mostly useful for custom clients and tests
    pub fn new(url: impl Into<String>, status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_str(&self.body).map_err(serialization_error)
    }
}

/// HTTP client abstraction
///
/// The transport builds complete requests and runs its hooks; a client only
/// sends them. Swap it out to route through a proxy or to fake the server.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a request and read the whole response
    async fn execute(&self, request: reqwest::Request) -> Result<HttpResponse, Error>;
}

/// Default HTTP client implementation using reqwest
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(network_error)?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: reqwest::Request) -> Result<HttpResponse, Error> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(network_error)?;

        let url = response.url().to_string();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(network_error)?;

        Ok(HttpResponse {
            url,
            status,
            headers,
            body,
        })
    }
}
