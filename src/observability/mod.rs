//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! handler / runner / upstream
//!     → logging.rs (structured tracing events, request_id on every line)
//!     → metrics.rs (outcome counters, latency histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
