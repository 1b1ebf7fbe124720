//! Rate limit enforcement middleware.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};

use crate::ratelimit::{Policy, RateKey, RateLimiter, Verdict};

use super::handlers::ApiResponse;

/// Header carrying the client's forwarded chain when the service sits
/// behind a proxy.
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Body text returned with every denied request.
const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";

/// Per-route middleware state: the shared limiter and the policy this
/// route is checked against.
#[derive(Clone)]
pub struct RouteLimit {
    limiter: Arc<RateLimiter>,
    policy: Policy,
}

impl RouteLimit {
    /// Pair a limiter with a route policy.
    pub fn new(limiter: Arc<RateLimiter>, policy: Policy) -> Self {
        Self { limiter, policy }
    }
}

/// Check the request against the route's policy before running it.
///
/// Allowed requests pass through unchanged; the downstream handler sees
/// no trace of the limiter. Denied requests are answered here with 429,
/// a `Retry-After` header, and the shared error body.
pub async fn enforce_rate_limit(
    State(route): State<RouteLimit>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let key = request_key(
        request.headers(),
        peer.map(|ConnectInfo(addr)| addr),
        request.uri().path(),
    );

    let verdict = route.limiter.decide(key.clone(), &route.policy);
    match verdict {
        Verdict::Allowed { remaining } => {
            debug!(key = %key, remaining, "Request within rate limit");
            next.run(request).await
        }
        Verdict::Denied { .. } => {
            let retry_secs = verdict.retry_after_secs().unwrap_or(1);
            info!(
                key = %key,
                retry_after_secs = retry_secs,
                "Request rate limited"
            );
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_secs.to_string())],
                Json(ApiResponse::error(RATE_LIMITED_MESSAGE)),
            )
                .into_response()
        }
    }
}

/// Derive the rate key for a request.
///
/// An unreadable forwarded header is treated the same as an absent one.
fn request_key(headers: &HeaderMap, peer: Option<SocketAddr>, route: &str) -> RateKey {
    let forwarded = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    RateKey::derive(forwarded.split(','), peer.map(|addr| addr.ip()), route)
}
