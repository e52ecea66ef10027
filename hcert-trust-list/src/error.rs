// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Errors surfaced by the trust-list service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrustListError {
    /// Upstream could not be reached, timed out, answered non-2xx, or failed
    /// its signature check.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Upstream answered, but the token or document could not be decoded.
    #[error("malformed trust list: {0}")]
    MalformedEncoding(String),

    #[error("not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,
}

impl TrustListError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UpstreamUnavailable(_) | Self::MalformedEncoding(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for TrustListError {
    fn into_response(self) -> Response {
        // Bodies stay generic; the detail is only logged.
        let body = match &self {
            Self::UpstreamUnavailable(_) | Self::MalformedEncoding(_) => "Bad Gateway",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
        };
        (self.status_code(), body).into_response()
    }
}

pub type TrustListResult<T> = Result<T, TrustListError>;
