//! API server setup and configuration.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::core::config::ServiceConfig;
use crate::core::dispatch::Dispatcher;
use crate::error::{MorphError, Result};

use super::{
    handlers::{convert_handler, formats_handler, mcp_handler, root_handler, validate_handler},
    types::{ApiSizeLimits, ApiState},
};

/// Parse size limits from environment variables.
///
/// Reads, in order of preference:
/// 1. `MORPH_MAX_REQUEST_BODY_BYTES` - limit in bytes
/// 2. `MORPH_MAX_UPLOAD_SIZE_MB` - limit in MB
///
/// Falls back to the default (100 MB) if neither is set or valid.
fn parse_size_limits_from_env() -> ApiSizeLimits {
    if let Ok(value) = std::env::var("MORPH_MAX_REQUEST_BODY_BYTES") {
        match value.parse::<usize>() {
            Ok(bytes) if bytes > 0 => {
                tracing::info!("Upload size limit configured from environment: {} bytes", bytes);
                return ApiSizeLimits::new(bytes);
            }
            _ => {
                tracing::warn!(
                    "Failed to parse MORPH_MAX_REQUEST_BODY_BYTES='{}', must be a positive integer",
                    value
                );
            }
        }
    }

    if let Ok(value) = std::env::var("MORPH_MAX_UPLOAD_SIZE_MB") {
        match value.parse::<usize>() {
            Ok(mb) if mb > 0 => {
                tracing::info!("Upload size limit configured from environment: {} MB", mb);
                return ApiSizeLimits::from_mb(mb);
            }
            _ => {
                tracing::warn!(
                    "Failed to parse MORPH_MAX_UPLOAD_SIZE_MB='{}', must be a positive integer",
                    value
                );
            }
        }
    }

    let limits = ApiSizeLimits::default();
    tracing::info!(
        "Upload size limit: 100 MB (default, {} bytes) - configure with MORPH_MAX_REQUEST_BODY_BYTES or MORPH_MAX_UPLOAD_SIZE_MB",
        limits.max_request_body_bytes
    );
    limits
}

/// Create the API router with all routes configured.
///
/// Public to allow embedding the router in another application.
pub fn create_router(config: ServiceConfig) -> Router {
    create_router_with_limits(config, ApiSizeLimits::default())
}

/// Create the API router with custom size limits.
pub fn create_router_with_limits(config: ServiceConfig, limits: ApiSizeLimits) -> Router {
    create_router_with_dispatcher(Arc::new(Dispatcher::new(config)), limits)
}

/// Create the API router around an existing dispatcher.
///
/// Used by tests to install instrumented converters.
pub fn create_router_with_dispatcher(dispatcher: Arc<Dispatcher>, limits: ApiSizeLimits) -> Router {
    let state = ApiState { dispatcher };

    // The default allows all origins for development convenience
    let cors_layer = if let Ok(origins_str) = std::env::var("MORPH_CORS_ORIGINS") {
        let origins: Vec<_> = origins_str
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();

        if !origins.is_empty() {
            tracing::info!("CORS configured with {} explicit allowed origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            tracing::warn!("MORPH_CORS_ORIGINS set but empty/invalid - falling back to permissive CORS");
            CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
        }
    } else {
        tracing::warn!(
            "CORS configured to allow all origins (default). For production, set the \
             MORPH_CORS_ORIGINS environment variable to a comma-separated list of allowed origins"
        );
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/formats", get(formats_handler))
        .route("/convert", post(convert_handler))
        .route("/mcp", post(mcp_handler))
        .route("/mcp/validate", post(validate_handler))
        .layer(DefaultBodyLimit::max(limits.max_request_body_bytes))
        .layer(RequestBodyLimitLayer::new(limits.max_request_body_bytes))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server with config file discovery.
///
/// Searches for `morph.toml` in the current and parent directories, using
/// defaults if none is found. Size limits come from the environment.
pub async fn serve(host: impl AsRef<str>, port: u16) -> Result<()> {
    let config = match ServiceConfig::discover()? {
        Some(config) => {
            tracing::info!("Loaded service config from discovered file");
            config
        }
        None => {
            tracing::info!("No config file found, using default configuration");
            ServiceConfig::default()
        }
    };

    let limits = parse_size_limits_from_env();
    serve_with_config_and_limits(host, port, config, limits).await
}

/// Start the API server with explicit config and default size limits.
pub async fn serve_with_config(host: impl AsRef<str>, port: u16, config: ServiceConfig) -> Result<()> {
    serve_with_config_and_limits(host, port, config, ApiSizeLimits::default()).await
}

/// Start the API server with explicit config and size limits.
pub async fn serve_with_config_and_limits(
    host: impl AsRef<str>,
    port: u16,
    config: ServiceConfig,
    limits: ApiSizeLimits,
) -> Result<()> {
    let ip: IpAddr = host
        .as_ref()
        .parse()
        .map_err(|e| MorphError::validation(format!("Invalid host address: {}", e)))?;

    let addr = SocketAddr::new(ip, port);
    let app = create_router_with_limits(config, limits);

    tracing::info!("Starting morph API server on http://{}:{}", ip, port);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(MorphError::Io)?;

    axum::serve(listener, app)
        .await
        .map_err(|e| MorphError::conversion_failed(format!("server error: {}", e)))?;

    Ok(())
}
