use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Caps in-flight requests across all routes and bounds each request's duration.
pub(crate) fn apply_limits(router: Router, max_in_flight: usize, timeout: Duration) -> Router {
    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(GlobalConcurrencyLimitLayer::new(max_in_flight))
}
