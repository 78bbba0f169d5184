//! HTTP server configuration and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Request/response logging
//! 3. Rate-limit token guard (selected routes)
//! 4. Handler execution
//!
//! Upstream latency is bounded by the upstream client, so a slow backend
//! still yields a JSON envelope.
//!
//! # Graceful Shutdown
//!
//! The server handles SIGTERM gracefully:
//! - Stops accepting new connections
//! - Waits for in-flight requests
//! - Returns once every connection has closed

use std::{collections::HashMap, net::SocketAddr};

use axum::{
    extract::{rejection::QueryRejection, Query, Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, MethodRouter},
    Router,
};
use bytes::Bytes;
use formgate_core::{catalog::ENDPOINTS, EndpointSpec, Method, Mode};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, info_span, warn, Span};
use uuid::Uuid;

use crate::{
    handlers::{self, gateway, readiness},
    middleware::rate_limit::rate_limit_guard,
    AppState,
};

/// Request identifier stored in request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Creates the Axum router with all routes and middleware.
///
/// Sets up:
/// - One route per endpoint table row
/// - Revalidation and health endpoints
/// - Request tracing and logging, keyed by request ID
///
/// # Example
///
/// ```no_run
/// use formgate_api::{create_router, AppState, Config};
///
/// fn build() -> anyhow::Result<axum::Router> {
///     let state = AppState::from_config(Config::load()?)?;
///     Ok(create_router(state))
/// }
/// ```
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check));

    let mut api_routes =
        Router::new().route("/api/revalidate", post(handlers::revalidate));

    for spec in ENDPOINTS {
        let mut route = endpoint_route(spec);
        if spec.rate_limited {
            let guard = middleware::from_fn_with_state(state.clone(), rate_limit_guard);
            route = route.route_layer(guard);
        }
        debug!(route = spec.route, upstream = %spec.upstream.template(), "Registered endpoint");
        api_routes = api_routes.route(spec.route, route);
    }

    Router::new()
        .merge(health_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Builds the method router serving one endpoint.
fn endpoint_route(spec: &'static EndpointSpec) -> MethodRouter<AppState> {
    if spec.mode == Mode::Degrade {
        return get(move |State(state): State<AppState>| readiness::handle(state, spec));
    }

    let handler = move |State(state): State<AppState>,
                        query: Result<Query<HashMap<String, String>>, QueryRejection>,
                        headers: HeaderMap,
                        body: Bytes| {
        gateway::handle(state, spec, query, headers, body)
    };

    match spec.method {
        Method::Get => get(handler),
        Method::Post => post(handler),
    }
}

/// Span for one HTTP request, tagged with the ID from [`inject_request_id`].
fn request_span(request: &Request) -> Span {
    let request_id = request.extensions().get::<RequestId>().map_or("-", |id| id.0.as_str());
    info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

/// Middleware to inject request ID into all responses.
///
/// Adds X-Request-Id header for tracing requests across services.
async fn inject_request_id(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let mut req = req;
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("x-request-id", header_value);
    }

    response
}

/// Starts the HTTP server with graceful shutdown support.
///
/// # Errors
///
/// Returns `std::io::Error` if:
/// - Port is already in use
/// - Network interface unavailable
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<(), std::io::Error> {
    let app = create_router(state);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("HTTP server listening on {}", actual_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Draining in-flight requests before exit");
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    #[test]
    fn request_span_carries_request_id() {
        let mut request = Request::new(Body::empty());
        request.extensions_mut().insert(RequestId("req-7".to_string()));

        tracing::subscriber::with_default(tracing_subscriber::registry(), || {
            let span = request_span(&request);
            assert!(!span.is_disabled());
            assert!(span.field("request_id").is_some());
            assert!(span.field("uri").is_some());
        });
    }
}
