//! Caller IP extraction.
//!
//! The remote address arrives as `host:port` (IPv6 hosts in brackets). The
//! parsed IP is attached to the request context under [`CLIENT_IP`].

use std::net::IpAddr;
use thiserror::Error;

use crate::context::Key;

/// Context key holding the caller's [`IpAddr`].
pub const CLIENT_IP: Key = Key::new("client-ip");

/// Why the caller's IP could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpExtractionError {
    #[error("remote address unavailable")]
    Missing,

    #[error("remote addr {0} is not host:port")]
    MalformedAddr(String),

    #[error("remote addr error, {0}")]
    InvalidIp(String),
}

/// Parse the IP out of a `host:port` remote address.
///
/// IPv4-mapped IPv6 peers (seen on dual-stack listeners) come back as IPv4.
pub fn parse_remote_addr(remote: &str) -> Result<IpAddr, IpExtractionError> {
    let host =
        split_host(remote).ok_or_else(|| IpExtractionError::MalformedAddr(remote.to_string()))?;
    host.parse::<IpAddr>()
        .map(|ip| ip.to_canonical())
        .map_err(|_| IpExtractionError::InvalidIp(remote.to_string()))
}

/// Extract the caller's IP from an optional remote address.
pub fn extract(remote: Option<&str>) -> Result<IpAddr, IpExtractionError> {
    remote
        .ok_or(IpExtractionError::Missing)
        .and_then(parse_remote_addr)
}

fn split_host(remote: &str) -> Option<&str> {
    if let Some(rest) = remote.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        if !after.starts_with(':') {
            return None;
        }
        return Some(host);
    }

    let (host, _port) = remote.rsplit_once(':')?;
    if host.contains(':') {
        return None;
    }
    Some(host)
}
