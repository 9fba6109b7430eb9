//! Request middleware: metrics and role-based write access

use axum::{
    extract::{MatchedPath, Request},
    http::Method,
    middleware::Next,
    response::Response,
};
use bookshop_common::{
    auth::{AccessPolicy, MaybeAuth},
    errors::Result,
    metrics::RequestMetrics,
};

/// Record request count and latency per matched route
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let tracker = RequestMetrics::start(request.method().as_str(), &endpoint);

    let response = next.run(request).await;
    tracker.finish(response.status().as_u16());
    response
}

/// Reads for everyone; writes for managers and admins, deletes for admins
pub async fn manager_or_read_only(
    method: Method,
    MaybeAuth(auth): MaybeAuth,
    request: Request,
    next: Next,
) -> Result<Response> {
    AccessPolicy::ManagerOrReadOnly.check(&method, auth.as_ref())?;
    Ok(next.run(request).await)
}

/// Any signed-in user may post a review; changing one is reserved to admins
pub async fn review_access(
    method: Method,
    MaybeAuth(auth): MaybeAuth,
    request: Request,
    next: Next,
) -> Result<Response> {
    let policy = if method == Method::POST {
        AccessPolicy::Authenticated
    } else {
        AccessPolicy::AdminOrReadOnly
    };
    policy.check(&method, auth.as_ref())?;
    Ok(next.run(request).await)
}
