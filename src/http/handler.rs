//! `GET /search` handler.
//!
//! # Flow
//! ```text
//! Start
//!     → derive deadline context from the base context (release held in scope)
//!     → read `q`                 (missing/empty → 406 "no query")
//!     → extract caller IP        (failure → IpPolicy decides)
//!     → attach CLIENT_IP
//!     → CallRunner::run          (Success / Failure / Cancelled)
//!     → Responded
//! ```

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::time::Instant;

use crate::config::IpPolicy;
use crate::http::client_ip::{self, CLIENT_IP};
use crate::http::request::RequestIdExt;
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::upstream::search_descriptor;

/// Handle one search request under the configured deadline.
pub async fn search_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();

    // Dropping `_release` on any return path stops the deadline timer.
    let (ctx, _release) = state.base.with_timeout(state.deadline);

    let query = match search_query(request.uri().query()) {
        Some(q) => q,
        None => {
            tracing::debug!(request_id = %request_id, "Search without query rejected");
            metrics::record_rejection("no_query");
            return response::no_query();
        }
    };

    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());

    let ctx = match client_ip::extract(remote.as_deref()) {
        Ok(ip) => ctx.with_value(CLIENT_IP, ip),
        Err(e) => match state.ip_policy {
            IpPolicy::BestEffort => {
                tracing::warn!(
                    request_id = %request_id,
                    error = %e,
                    "Client IP unavailable, searching without userip"
                );
                ctx
            }
            IpPolicy::Require => {
                tracing::warn!(
                    request_id = %request_id,
                    error = %e,
                    "Client IP unavailable, request rejected"
                );
                metrics::record_rejection("client_ip");
                return response::ip_required(&e);
            }
        },
    };

    tracing::debug!(
        request_id = %request_id,
        query = %query,
        deadline_ms = state.deadline.as_millis() as u64,
        "Dispatching search"
    );

    let descriptor = search_descriptor(&state.api, &ctx, &query);
    let outcome = state.runner.run(&ctx, descriptor).await;

    tracing::info!(
        request_id = %request_id,
        query = %query,
        outcome = outcome.kind(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Search finished"
    );
    metrics::record_outcome(outcome.kind(), start_time);

    outcome.into_response()
}

/// First `q` value of the query string, if present and non-empty.
fn search_query(raw: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(raw?.as_bytes())
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
