//! Upstream forwarding.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the configured upstream
//! - Relay the upstream response unchanged
//! - Map a missing upstream to 503 and a failed exchange to 502
//!
//! # Design Decisions
//! - No retries; one client request is one upstream exchange
//! - Bodies are streamed, not buffered

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    response::Response,
};
use crate::http::response::{self, UPSTREAM_ERROR, UPSTREAM_UNAVAILABLE};
use crate::http::server::AppState;
use crate::limiter::EndpointClass;

pub async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let class = request
        .extensions()
        .get::<EndpointClass>()
        .copied()
        .unwrap_or(EndpointClass::General);

    let Some(authority) = state.upstream.clone() else {
        tracing::warn!(path = %request.uri().path(), "No upstream configured");
        return response::gateway_error(
            StatusCode::SERVICE_UNAVAILABLE,
            UPSTREAM_UNAVAILABLE,
            "No upstream configured",
        );
    };

    let (mut parts, body) = request.into_parts();
    parts.uri = match upstream_uri(&parts.uri, authority) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(uri = %parts.uri, error = %e, "Failed to rewrite request URI");
            return response::gateway_error(StatusCode::BAD_GATEWAY, UPSTREAM_ERROR, "Invalid request URI");
        }
    };

    tracing::debug!(method = %parts.method, uri = %parts.uri, class = %class, "Forwarding request");

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(upstream) => {
            let (parts, body) = upstream.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(error = %e, class = %class, "Upstream error");
            response::gateway_error(StatusCode::BAD_GATEWAY, UPSTREAM_ERROR, "Upstream request failed")
        }
    }
}

fn upstream_uri(original: &Uri, authority: Authority) -> Result<Uri, axum::http::uri::InvalidUriParts> {
    let mut parts = original.clone().into_parts();
    parts.scheme = Some(Scheme::HTTP);
    parts.authority = Some(authority);
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    Uri::from_parts(parts)
}
