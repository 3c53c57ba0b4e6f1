//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → request.rs (request ID)
//!     → handler.rs (deadline context, query, client IP, runner)
//!     → response.rs (outcome → status + body)
//!     → Send to client
//! ```

pub mod client_ip;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use client_ip::{IpExtractionError, CLIENT_IP};
pub use request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
