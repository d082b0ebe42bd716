//! Reusable HTTP server for the JSON RPC surface with CORS support.
//!
//! # Example
//!
//! ```ignore
//! use common::rpc::{RpcServerConfig, CorsConfig, run_rpc_server};
//!
//! let config = RpcServerConfig {
//!     port: 3000,
//!     cors_config: Some(CorsConfig::allow_all()),
//!     ..Default::default()
//! };
//!
//! run_rpc_server(config, build_crm_api_router(state), cancellation_token).await?;
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context as _;
use axum::routing::get;
use axum::Router;
use http::{header::HeaderName, Method};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, error};

use super::{RpcLoggingConfig, RpcLoggingLayer, RpcTracingConfig, RpcTracingLayer};

/// CORS configuration for the RPC server.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Use `vec!["*".to_string()]` to allow all origins.
    pub allowed_origins: Vec<String>,
    /// Max age for CORS preflight cache in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            max_age_secs: 3600,
        }
    }
}

impl CorsConfig {
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parse comma-separated origins string.
    pub fn from_comma_separated(origins: &str) -> Self {
        let allowed_origins: Vec<String> = origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            allowed_origins: if allowed_origins.is_empty() {
                vec!["*".to_string()]
            } else {
                allowed_origins
            },
            ..Default::default()
        }
    }
}

/// Configuration for the RPC server.
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
    pub logging_config: RpcLoggingConfig,
    pub tracing_config: RpcTracingConfig,
    /// CORS is disabled when unset
    pub cors_config: Option<CorsConfig>,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            logging_config: RpcLoggingConfig::default(),
            tracing_config: RpcTracingConfig::default(),
            cors_config: None,
        }
    }
}

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let allow_origin = if config.allowed_origins.len() == 1 && config.allowed_origins[0] == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("traceparent"),
        ])
        .max_age(Duration::from_secs(config.max_age_secs))
}

async fn healthz() -> &'static str {
    "ok"
}

/// Wrap RPC routes with the health check and the server middleware stack.
pub fn with_middleware(config: &RpcServerConfig, routes: Router) -> Router {
    let router = routes
        .route("/healthz", get(healthz))
        .layer(RpcLoggingLayer::new(config.logging_config.clone()))
        .layer(RpcTracingLayer::new(config.tracing_config.clone()));

    match &config.cors_config {
        Some(cors) => router.layer(build_cors_layer(cors)),
        None => router,
    }
}

/// Serve the routes until the cancellation token fires.
pub async fn run_rpc_server(
    config: RpcServerConfig,
    routes: Router,
    cancellation_token: CancellationToken,
) -> Result<(), anyhow::Error> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid server address {}:{}", config.host, config.port))?;

    debug!(
        address = %addr,
        cors = config.cors_config.is_some(),
        "Starting RPC server"
    );

    let app = with_middleware(&config, routes);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        cancellation_token.cancelled().await;
        debug!("RPC server shutdown signal received");
    });

    match serve.await {
        Ok(_) => {
            debug!("RPC server stopped gracefully");
            Ok(())
        }
        Err(e) => {
            error!("RPC server error: {}", e);
            Err(e.into())
        }
    }
}
