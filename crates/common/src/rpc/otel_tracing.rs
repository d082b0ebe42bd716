use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::{Request, Response};
use opentelemetry::{global, propagation::Extractor, trace::TraceContextExt as _};
use tower::{Layer, Service};
use tracing::{field, info_span, Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Configuration for RPC tracing middleware
#[derive(Clone, Debug)]
pub struct RpcTracingConfig {
    /// Path prefixes that get no span
    pub ignored_paths: Vec<String>,
}

impl Default for RpcTracingConfig {
    fn default() -> Self {
        Self {
            ignored_paths: vec!["/healthz".to_string()],
        }
    }
}

impl RpcTracingConfig {
    pub fn new(ignored_paths: Vec<String>) -> Self {
        Self { ignored_paths }
    }

    fn should_ignore(&self, path: &str) -> bool {
        self.ignored_paths
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }
}

/// Tower layer for OpenTelemetry tracing of RPC requests
#[derive(Clone)]
pub struct RpcTracingLayer {
    config: RpcTracingConfig,
}

impl RpcTracingLayer {
    pub fn new(config: RpcTracingConfig) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for RpcTracingLayer {
    type Service = RpcTracingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RpcTracingService {
            inner: service,
            config: self.config.clone(),
        }
    }
}

/// Service that opens a span per request, parented on the incoming W3C context
#[derive(Clone)]
pub struct RpcTracingService<S> {
    inner: S,
    config: RpcTracingConfig,
}

struct HttpHeaderExtractor<'a>(&'a http::HeaderMap);

impl Extractor for HttpHeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Split an RPC path into router and procedure names
/// e.g., "/rpc/contact.addLink" -> ("contact", "addLink")
fn split_procedure(path: &str) -> (&str, &str) {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.split_once('.') {
        Some((router, procedure)) => (router, procedure),
        None => ("", name),
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RpcTracingService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Error: std::fmt::Display,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let path = req.uri().path().to_string();

        if self.config.should_ignore(&path) {
            return Box::pin(self.inner.call(req));
        }

        let parent_context = global::get_text_map_propagator(|propagator| {
            propagator.extract(&HttpHeaderExtractor(req.headers()))
        });

        let (router, procedure) = split_procedure(&path);
        let otel_name = format!("{}.{}", router, procedure);

        let span = info_span!(
            target: "rpc",
            "rpc_request",
            otel.name = %otel_name,
            rpc.system = "http_json",
            rpc.service = %router,
            rpc.method = %procedure,
            http.response.status_code = field::Empty,
            otel.status_code = field::Empty,
            trace_id = field::Empty,
            span_id = field::Empty,
        );
        span.set_parent(parent_context);

        let mut inner = self.inner.clone();

        Box::pin(
            async move {
                // The OTel layer has assigned IDs once inside the span
                let current_span = Span::current();
                let otel_context = current_span.context();
                let otel_span = otel_context.span();
                let span_context = otel_span.span_context();
                if span_context.is_valid() {
                    current_span.record("trace_id", span_context.trace_id().to_string());
                    current_span.record("span_id", span_context.span_id().to_string());
                }

                let result = inner.call(req).await;

                match &result {
                    Ok(response) => {
                        let status = response.status();
                        current_span.record("http.response.status_code", status.as_u16());
                        if status.is_server_error() {
                            current_span.record("otel.status_code", "ERROR");
                        }
                    }
                    Err(_) => {
                        current_span.record("otel.status_code", "ERROR");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_procedure() {
        assert_eq!(split_procedure("/rpc/contact.addLink"), ("contact", "addLink"));
        assert_eq!(split_procedure("/rpc/project.getAll"), ("project", "getAll"));
        assert_eq!(split_procedure("/healthz"), ("", "healthz"));
    }

    #[test]
    fn test_config_should_ignore() {
        let config = RpcTracingConfig::default();
        assert!(config.should_ignore("/healthz"));
        assert!(!config.should_ignore("/rpc/contact.get"));
    }
}
