use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{error, info, warn, Instrument, Span};

/// Configuration for RPC request logging
#[derive(Clone, Debug)]
pub struct RpcLoggingConfig {
    /// Path prefixes that are not logged (health checks)
    pub ignored_paths: Vec<String>,
}

impl Default for RpcLoggingConfig {
    fn default() -> Self {
        Self {
            ignored_paths: vec!["/healthz".to_string()],
        }
    }
}

impl RpcLoggingConfig {
    pub fn new(ignored_paths: Vec<String>) -> Self {
        Self { ignored_paths }
    }

    fn should_ignore(&self, path: &str) -> bool {
        self.ignored_paths
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }
}

/// Tower layer for logging RPC requests
#[derive(Clone)]
pub struct RpcLoggingLayer {
    config: RpcLoggingConfig,
}

impl RpcLoggingLayer {
    pub fn new(config: RpcLoggingConfig) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for RpcLoggingLayer {
    type Service = RpcLoggingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RpcLoggingService {
            inner: service,
            config: self.config.clone(),
        }
    }
}

/// Service that logs path, status and duration of each request
#[derive(Clone)]
pub struct RpcLoggingService<S> {
    inner: S,
    config: RpcLoggingConfig,
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for RpcLoggingService<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
    S::Error: std::fmt::Display,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<ReqBody>) -> Self::Future {
        let path = req.uri().path().to_string();
        let should_ignore = self.config.should_ignore(&path);
        let start = Instant::now();
        let future = self.inner.call(req);

        // Keep logs correlated with the request span
        let span = Span::current();

        Box::pin(
            async move {
                let result = future.await;

                if !should_ignore {
                    let duration = start.elapsed();

                    match &result {
                        Ok(response) => {
                            let status = response.status();
                            if status.is_server_error() {
                                error!(
                                    path = %path,
                                    http_status = %status.as_u16(),
                                    duration_ms = %duration.as_millis(),
                                    "{} - {}ms - {}",
                                    path,
                                    duration.as_millis(),
                                    status
                                );
                            } else if status.is_client_error() {
                                warn!(
                                    path = %path,
                                    http_status = %status.as_u16(),
                                    duration_ms = %duration.as_millis(),
                                    "{} - {}ms - {}",
                                    path,
                                    duration.as_millis(),
                                    status
                                );
                            } else {
                                info!(
                                    path = %path,
                                    http_status = %status.as_u16(),
                                    duration_ms = %duration.as_millis(),
                                    "{} - {}ms",
                                    path,
                                    duration.as_millis()
                                );
                            }
                        }
                        Err(e) => {
                            error!(
                                path = %path,
                                duration_ms = %duration.as_millis(),
                                error = %e,
                                "{} - {}ms - ERROR: {}",
                                path,
                                duration.as_millis(),
                                e
                            );
                        }
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
