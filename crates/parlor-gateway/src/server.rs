// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. Three route groups:
//! public (health/metrics), webhooks (unauthenticated, the upstream
//! platform delivers them), and admin (optional bearer auth).

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use parlor_core::ParlorError;
use parlor_engine::AllocationEngine;
use tower_http::cors::CorsLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Health state for the unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The allocation engine processing triggers.
    pub engine: Arc<AllocationEngine>,
    /// Authentication configuration for admin routes.
    pub auth: AuthConfig,
    /// Health state for unauthenticated endpoints.
    pub health: HealthState,
    /// Upper bound on one background queue re-scan.
    pub rescan_timeout: Duration,
}

/// Gateway server configuration (mirrors ServiceConfig from parlor-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the gateway router over the given state.
pub fn router(state: GatewayState) -> Router {
    // Unauthenticated public routes (health + metrics for systemd and Prometheus).
    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .route("/metrics", get(handlers::get_public_metrics))
        .with_state(state.clone());

    // Webhook routes delivered by the upstream chat platform.
    let webhook_routes = Router::new()
        .route("/webhooks/session", post(handlers::post_session))
        .route("/webhooks/resolve", post(handlers::post_resolve))
        .with_state(state.clone());

    // Admin routes behind optional bearer auth.
    let admin_routes = Router::new()
        .route("/rooms", get(handlers::get_rooms).post(handlers::post_room))
        .route("/rooms/resolve-all", post(handlers::post_resolve_all))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(webhook_routes)
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server.
///
/// Binds to the configured host:port and serves until the task is aborted.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), ParlorError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ParlorError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| ParlorError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
