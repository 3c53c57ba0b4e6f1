//! Deadline-bounded search front-end.
//!
//! Every `GET /search` derives a deadline context, forwards the caller's IP
//! through it, and races one upstream call against that deadline.

pub mod config;
pub mod context;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod runner;
pub mod upstream;

pub use config::SearchConfig;
pub use context::{Canceler, Context, ContextError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use runner::{CallRunner, Outcome};
