//! # Routes
//!
//! Axum router configuration for the checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - POST /api/v1/checkout - Create checkout session
/// - POST /.netlify/functions/checkout - Same handler, for storefronts built
///   against the old serverless path
/// - GET  /health - Health check
///
/// Any other verb on a checkout path gets 405 with a plain-text body.
pub fn create_router(state: AppState) -> Router {
    // The storefront may be served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // Checkout
        .route("/api/v1/checkout", checkout_route())
        .route("/.netlify/functions/checkout", checkout_route())
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}

fn checkout_route() -> MethodRouter<AppState> {
    post(handlers::create_checkout).fallback(handlers::method_not_allowed)
}
