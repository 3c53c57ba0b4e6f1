//! Response rendering.
//!
//! # Responsibilities
//! - Map each call outcome to a status code and body
//! - Render client input errors
//!
//! # Design Decisions
//! - Upstream failures result in 502 Bad Gateway, body = error text
//! - Cancellation results in 504 Gateway Timeout, body = context error text
//! - Success is the decoded result as JSON

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::client_ip::IpExtractionError;
use crate::runner::Outcome;

/// Body returned when `q` is missing or empty.
pub const NO_QUERY: &str = "no query";

pub fn no_query() -> Response {
    (StatusCode::NOT_ACCEPTABLE, NO_QUERY).into_response()
}

pub fn ip_required(err: &IpExtractionError) -> Response {
    (StatusCode::BAD_REQUEST, err.to_string()).into_response()
}

impl<T: Serialize> IntoResponse for Outcome<T> {
    fn into_response(self) -> Response {
        match self {
            Outcome::Success(value) => (StatusCode::OK, Json(value)).into_response(),
            Outcome::Failure(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
            Outcome::Cancelled(e) => (StatusCode::GATEWAY_TIMEOUT, e.to_string()).into_response(),
        }
    }
}
