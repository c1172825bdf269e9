//! Retries for chat exchanges that failed transiently
//!
//! The conversation loop never retries; put this layer under it to retry
//! network failures, timeouts, rate limits and server errors. Client errors
//! such as HTTP 4xx come back on the first attempt.

use crate::{BoxFuture, Layer, Service};
use palaver_core::{Error, Request, Response};
use std::time::Duration;
use tracing::{debug, warn};

/// How often and how patiently to retry an exchange
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts in total, the first one included
    pub max_attempts: u32,
    /// Pause before the second attempt
    pub initial_backoff: Duration,
    /// Upper bound for any single pause
    pub max_backoff: Duration,
    /// Growth factor between consecutive pauses
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Pause after the given failed attempt (1-based)
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        if !millis.is_finite() || millis >= self.max_backoff.as_millis() as f64 {
            return self.max_backoff;
        }
        Duration::from_millis(millis as u64)
    }

    /// Whether the exchange deserves another attempt after `error`
    pub fn should_retry(&self, error: &Error, failed_attempt: u32) -> bool {
        error.is_transient() && failed_attempt < self.max_attempts
    }
}

/// Layer that retries transient transport failures
#[derive(Debug, Clone, Default)]
pub struct RetryLayer {
    config: RetryConfig,
}

impl RetryLayer {
    /// Retry with [`RetryConfig::default`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Retry with the given policy
    pub fn with_config(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService {
            inner,
            config: self.config.clone(),
        }
    }
}

/// Service produced by [`RetryLayer`]
#[derive(Debug, Clone)]
pub struct RetryService<S> {
    inner: S,
    config: RetryConfig,
}

impl<S> Service<Request> for RetryService<S>
where
    S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Error;
    type Future = BoxFuture<Result<Response, Error>>;

    fn call(&mut self, request: Request) -> Self::Future {
        let inner = self.inner.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let mut attempt = 1;
            loop {
                let error = match inner.clone().call(request.clone()).await {
                    Ok(response) => {
                        if attempt > 1 {
                            debug!(attempt, model = %request.model, "exchange recovered");
                        }
                        return Ok(response);
                    }
                    Err(error) => error,
                };

                if !config.should_retry(&error, attempt) {
                    if error.is_transient() {
                        warn!(attempts = attempt, error = %error, "giving up on exchange");
                    } else {
                        debug!(error = %error, "exchange failed permanently");
                    }
                    return Err(error);
                }

                let pause = config.backoff(attempt);
                warn!(
                    attempt,
                    backoff_ms = pause.as_millis() as u64,
                    error = %error,
                    "exchange failed, retrying"
                );
                tokio::time::sleep(pause).await;
                attempt += 1;
            }
        })
    }
}
