//! HTTP boundary for the rate limiter.

pub mod handlers;
pub mod middleware;

mod server;

pub use server::HttpServer;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::ratelimit::{Policy, RateLimiter};

use middleware::{enforce_rate_limit, RouteLimit};

/// Assemble the service router.
///
/// Each guarded route gets its own policy but shares the limiter, so
/// contact and subscribe quotas are tracked per route while living in
/// one store. The rate limit check runs only for matching methods; a
/// request with the wrong method gets its 405 without being counted.
pub fn router(limiter: Arc<RateLimiter>, contact: Policy, subscribe: Policy) -> Router {
    Router::new()
        .route(
            "/api/contact",
            post(handlers::contact).route_layer(from_fn_with_state(
                RouteLimit::new(Arc::clone(&limiter), contact),
                enforce_rate_limit,
            )),
        )
        .route(
            "/api/subscribe",
            post(handlers::subscribe).route_layer(from_fn_with_state(
                RouteLimit::new(limiter, subscribe),
                enforce_rate_limit,
            )),
        )
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
}
