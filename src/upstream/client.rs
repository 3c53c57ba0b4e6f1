//! HTTP client for the splash API.
//!
//! # Responsibilities
//! - Build the outbound request from a [`CallDescriptor`]
//! - Map transport, status and decode failures to [`CallError`]
//! - Attach the caller's IP (when the context carries one) as `userip`

use std::net::IpAddr;
use std::time::Duration;
use url::Url;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::context::Context;
use crate::http::client_ip::CLIENT_IP;
use crate::runner::CallError;
use crate::upstream::descriptor::CallDescriptor;
use crate::upstream::types::{SearchResult, SplashResponse};

/// Thin wrapper over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
}

impl SearchClient {
    /// Build a client with the configured connect timeout and user agent.
    ///
    /// The overall call is bounded by the request context, not by reqwest.
    pub fn new(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(timeouts.connect_ms))
            .user_agent(upstream.user_agent.clone());
        if !upstream.system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;
        Ok(Self { http })
    }

    /// Send `descriptor` and decode the splash envelope.
    pub async fn execute(&self, descriptor: CallDescriptor) -> Result<SearchResult, CallError> {
        let target = descriptor.target();
        let response = self
            .http
            .request(descriptor.method().clone(), target)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let envelope: SplashResponse = serde_json::from_slice(&body)?;

        tracing::debug!(
            upstream_status = envelope.status,
            upstream_msg = %envelope.msg,
            "Upstream replied"
        );

        Ok(envelope.data)
    }
}

/// Describe the splash search for `query`, forwarding the caller's IP if
/// `ctx` carries one.
pub fn search_descriptor(api: &Url, ctx: &Context, query: &str) -> CallDescriptor {
    let descriptor = CallDescriptor::get(api.clone()).with_query("q", query);
    match ctx.value::<IpAddr>(CLIENT_IP) {
        Ok(ip) => descriptor.with_query("userip", ip.to_canonical().to_string()),
        Err(_) => descriptor,
    }
}
