//! Outbound splash API.
//!
//! # Data Flow
//! ```text
//! handler
//!     → client::search_descriptor (q, userip from context)
//!     → runner::CallRunner::run
//!     → client::SearchClient::execute (reqwest GET, JSON decode)
//!     → SearchResult
//! ```

pub mod client;
pub mod descriptor;
pub mod types;

pub use client::{search_descriptor, SearchClient};
pub use descriptor::CallDescriptor;
pub use types::{SearchResult, SplashResponse};
