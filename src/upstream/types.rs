//! Wire types of the splash API.

use serde::{Deserialize, Serialize};

/// One search result as returned to our caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    pub timestamp: String,
    pub expire: String,
    pub scheme: String,
    pub image_url: String,
}

/// Envelope around [`SearchResult`] sent by the upstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SplashResponse {
    pub status: i64,
    pub msg: String,
    pub data: SearchResult,
}
