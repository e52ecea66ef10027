// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! HTTP surface.
//!
//! - `GET /trust-list/prod|test`: the cached document as JSON
//! - `OPTIONS` on any path: CORS preflight
//! - anything else: 404 for unknown paths, 405 for other methods

use axum::extract::{Path, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ALLOW, CACHE_CONTROL, CONTENT_TYPE, ORIGIN,
};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::authority::Authority;
use crate::error::TrustListError;
use crate::service::TrustListService;

const ALLOWED_METHODS: &str = "GET, OPTIONS";

pub fn router(service: TrustListService) -> Router {
    Router::new()
        .route(
            "/trust-list/:authority",
            get(get_trust_list).options(preflight).fallback(method_not_allowed),
        )
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn get_trust_list(
    State(service): State<TrustListService>,
    Path(segment): Path<String>,
) -> Result<Response, TrustListError> {
    let authority = Authority::from_path_segment(&segment).ok_or(TrustListError::NotFound)?;

    let entry = service.serve(authority).await.map_err(|e| {
        warn!(%authority, error = %e, "failed to serve trust list");
        e
    })?;

    let headers = [
        (CONTENT_TYPE, "application/json".to_string()),
        (CACHE_CONTROL, format!("s-maxage={}", service.cache_ttl().as_secs())),
        (ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
    ];
    Ok((StatusCode::OK, headers, entry.body().to_string()).into_response())
}

/// Full CORS headers only for a real preflight; a bare OPTIONS gets `Allow`.
async fn preflight(headers: HeaderMap) -> Response {
    let is_preflight = [ORIGIN, ACCESS_CONTROL_REQUEST_METHOD, ACCESS_CONTROL_REQUEST_HEADERS]
        .iter()
        .all(|name| headers.contains_key(name));

    if is_preflight {
        (
            StatusCode::OK,
            [
                (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
                (ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
                (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            ],
        )
            .into_response()
    } else {
        (StatusCode::OK, [(ALLOW, ALLOWED_METHODS)]).into_response()
    }
}

async fn method_not_allowed() -> TrustListError {
    TrustListError::MethodNotAllowed
}

async fn fallback(method: Method, headers: HeaderMap) -> Response {
    match method {
        Method::OPTIONS => preflight(headers).await,
        Method::GET => TrustListError::NotFound.into_response(),
        _ => TrustListError::MethodNotAllowed.into_response(),
    }
}
